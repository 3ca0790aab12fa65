use crate::node::{Context, Node};
use crate::types::{GraphState, NodeResult};
use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result};
use std::future::Future;
use std::marker::PhantomData;

/// A node that processes state using a closure
pub struct FunctionNode<S, F> {
    name: String,
    f: F,
    _phantom: PhantomData<fn() -> S>,
}

impl<S, F, Fut> FunctionNode<S, F>
where
    S: GraphState,
    F: Fn(&Context, S) -> Fut + Send + Sync,
    Fut: Future<Output = NodeResult<S>> + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<S, F, Fut> Node<S> for FunctionNode<S, F>
where
    S: GraphState,
    F: Fn(&Context, S) -> Fut + Send + Sync,
    Fut: Future<Output = NodeResult<S>> + Send,
{
    async fn process(&self, ctx: &Context, state: S) -> NodeResult<S> {
        (self.f)(ctx, state).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<S, F> Debug for FunctionNode<S, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("FunctionNode")
            .field("name", &self.name)
            .finish()
    }
}
