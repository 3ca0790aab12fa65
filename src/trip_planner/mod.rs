//! Trip-planner subgraph: classify, then extract, then call tools.
//!
//! ```text
//! START -> classify -+- trip details -> callTools -> END
//!                    +- none ---------> extract -+- trip details -> callTools
//!                                                +- none ---------> END
//! ```

mod call_tools;
mod classify;
mod extraction;
pub mod tools;
mod validation;

pub use call_tools::{CallToolsNode, CALL_TOOLS_NODE};
pub use classify::{ClassifyNode, CLASSIFY_NODE};
pub use extraction::{resolve_trip_dates, ExtractNode, ExtractedTripDetails, EXTRACT_NODE};

use crate::services::AgentServices;
use crate::state::{Route, TripState};
use std::sync::Arc;
use tripgraph_core::{Built, Graph, END, START};

fn after_classify(state: &TripState) -> String {
    match state.trip_details {
        Some(_) => CALL_TOOLS_NODE.to_string(),
        None => EXTRACT_NODE.to_string(),
    }
}

fn after_extract(state: &TripState) -> String {
    match state.trip_details {
        Some(_) => CALL_TOOLS_NODE.to_string(),
        None => END.to_string(),
    }
}

pub fn build_trip_planner(services: Arc<AgentServices>) -> Graph<TripState, Built> {
    let mut graph = Graph::new(Route::TripPlanner.as_str());
    graph
        .add_node(ClassifyNode::new(Arc::clone(&services)))
        .add_node(ExtractNode::new(Arc::clone(&services)))
        .add_node(CallToolsNode::new(services))
        .add_edge(START, CLASSIFY_NODE)
        .add_conditional_edge(CLASSIFY_NODE, after_classify)
        .add_conditional_edge(EXTRACT_NODE, after_extract)
        .add_edge(CALL_TOOLS_NODE, END);
    graph.build()
}
