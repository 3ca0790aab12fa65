use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

use super::*;
use crate::node::*;
use crate::resilience::{safe_execute, SafeExecuteOptions};
use crate::types::*;

pub const START: &str = "__start__";
pub const END: &str = "__end__";

/// Maximum node steps per run unless overridden.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// A graph that executes nodes in a defined order
#[derive(Debug)]
pub struct Graph<State, BuildState = NotBuilt> {
    graph_name: String,
    nodes: HashMap<String, Arc<dyn Node<State>>>,
    edges: HashMap<String, Edge<State>>,
    configs: HashMap<String, NodeConfig>,
    recursion_limit: usize,
    // Structural problems found by `build`, reported on `run`
    invalid: Option<String>,
    _build_state: PhantomData<BuildState>,
}

impl<S> Graph<S, NotBuilt>
where
    S: GraphState,
{
    /// Create a new graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph_name: name.into(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            configs: HashMap::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            invalid: None,
            _build_state: PhantomData,
        }
    }

    /// Add a node to the graph
    pub fn add_node<N>(&mut self, node: N) -> &mut Self
    where
        N: Node<S> + 'static,
    {
        self.nodes.insert(node.name().to_string(), Arc::new(node));
        self
    }

    /// Add a direct edge between nodes
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.insert(from.into(), Edge::Direct(to.into()));
        self
    }

    /// Add a conditional edge from a node
    pub fn add_conditional_edge<F>(&mut self, from: impl Into<String>, condition: F) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        self.edges
            .insert(from.into(), Edge::Conditional(Arc::new(condition)));
        self
    }

    /// Configure a node with specific settings
    pub fn configure_node(&mut self, name: impl Into<String>, config: NodeConfig) -> &mut Self {
        self.configs.insert(name.into(), config);
        self
    }

    pub fn with_recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    fn validate(&self) -> Option<String> {
        if !self.edges.contains_key(START) {
            return Some(format!("Graph {} has no edge from START", self.graph_name));
        }
        self.edges.iter().find_map(|(from, edge)| match edge {
            Edge::Direct(to) if to != END && !self.nodes.contains_key(to) => {
                Some(format!("Edge {} -> {} targets an unknown node", from, to))
            }
            _ => None,
        })
    }

    /// Build the graph, making it ready for execution
    pub fn build(self) -> Graph<S, Built> {
        let invalid = self.validate();
        Graph {
            graph_name: self.graph_name,
            nodes: self.nodes,
            edges: self.edges,
            configs: self.configs,
            recursion_limit: self.recursion_limit,
            invalid,
            _build_state: PhantomData,
        }
    }
}

impl<S> Graph<S, Built>
where
    S: GraphState,
{
    /// Run the graph with an initial state
    pub async fn run(&self, ctx: &Context, initial_state: S) -> GraphResult<S> {
        if let Some(reason) = &self.invalid {
            return Err(GraphError::InvalidState(reason.clone()));
        }

        let mut current_state = initial_state;
        let mut current_node = START.to_string();
        let mut steps = 0;

        loop {
            let next_node = self
                .edges
                .get(&current_node)
                .map(|edge| edge.next(&current_state))
                .ok_or_else(|| {
                    GraphError::InvalidTransition(format!(
                        "No transition defined from node: {}",
                        current_node
                    ))
                })?;

            if next_node == END {
                break;
            }

            steps += 1;
            if steps > self.recursion_limit {
                return Err(GraphError::RecursionLimit(self.recursion_limit));
            }

            let node = self
                .nodes
                .get(&next_node)
                .ok_or_else(|| GraphError::NodeNotFound(next_node.clone()))?;

            info!(graph = %self.graph_name, node = %next_node, trace_id = %ctx.trace_id, "Entering node");
            let output = self.execute_node(ctx, &next_node, node, &current_state).await?;
            output.apply_to(&mut current_state);
            debug!(graph = %self.graph_name, node = %next_node, "Node completed");

            current_node = next_node;
        }

        Ok(current_state)
    }

    async fn execute_node(
        &self,
        ctx: &Context,
        name: &str,
        node: &Arc<dyn Node<S>>,
        state: &S,
    ) -> Result<NodeOutput<S>, GraphError> {
        let config = self.configs.get(name).cloned().unwrap_or_default();
        let options = SafeExecuteOptions {
            retry: config.retry,
            timeout: config.timeout,
            fallback: None,
        };

        let mut attempt = 0;
        let run_once = || {
            attempt += 1;
            // retried attempts get their own trace
            let node_ctx = if attempt == 1 {
                ctx.clone()
            } else {
                ctx.next_node_context()
            };
            let node = Arc::clone(node);
            let state = state.clone();
            async move { node.process(&node_ctx, state).await }
        };

        safe_execute(name, options, run_once)
            .await
            .map_err(GraphError::Node)
    }

    pub fn name(&self) -> &str {
        &self.graph_name
    }
}

#[async_trait]
impl<S> Node<S> for Graph<S, Built>
where
    S: GraphState,
{
    async fn process(&self, ctx: &Context, state: S) -> NodeResult<S> {
        let new_state = self.run(&ctx.next_node_context(), state).await?;
        Ok(NodeOutput::Full(new_state))
    }

    fn name(&self) -> &str {
        &self.graph_name
    }
}
