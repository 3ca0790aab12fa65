use std::fmt::{Debug, Formatter, Result};
use std::sync::Arc;

/// Picks the next node name from the current state
pub type Condition<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Edge definition for graph transitions
#[derive(Clone)]
pub enum Edge<S> {
    /// Direct edge to next node
    Direct(String),
    /// Conditional edge based on state
    Conditional(Condition<S>),
}

impl<S> Edge<S> {
    pub(crate) fn next(&self, state: &S) -> String {
        match self {
            Edge::Direct(target) => target.clone(),
            Edge::Conditional(condition) => condition(state),
        }
    }
}

impl<S> Debug for Edge<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional(_) => f.debug_tuple("Conditional").field(&"<condition>").finish(),
        }
    }
}
