//! Top-level graph: route each turn to the trip planner or general input.

mod general_input;
mod router;

pub use general_input::{GeneralInputNode, APOLOGY, GENERAL_INPUT_NODE};
pub use router::{RouterNode, ROUTER_NODE, ROUTE_DESCRIPTIONS};

use crate::services::AgentServices;
use crate::state::{Route, TripState};
use crate::trip_planner::build_trip_planner;
use std::sync::Arc;
use tripgraph_core::{Built, Graph, END, START};

pub const SUPERVISOR_GRAPH: &str = "supervisor";

fn handle_route(state: &TripState) -> String {
    state
        .next
        .map_or_else(|| END.to_string(), |route| route.to_string())
}

/// Router, then exactly one branch, then END.
pub fn build_supervisor(services: Arc<AgentServices>) -> Graph<TripState, Built> {
    let mut graph = Graph::new(SUPERVISOR_GRAPH);
    graph
        .add_node(RouterNode::new(Arc::clone(&services)))
        .add_node(build_trip_planner(Arc::clone(&services)))
        .add_node(GeneralInputNode::new(services))
        .add_edge(START, ROUTER_NODE)
        .add_conditional_edge(ROUTER_NODE, handle_route)
        .add_edge(Route::TripPlanner.as_str(), END)
        .add_edge(GENERAL_INPUT_NODE, END);
    graph.build()
}
