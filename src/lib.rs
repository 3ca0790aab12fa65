//! TripGraph: a conversational trip-planning agent.
//!
//! A supervisor graph routes every user turn either to the trip-planner
//! subgraph (classify, extract, call tools) or to a general conversational
//! node. All model calls and tool handlers run through the resilience kernel
//! of [`tripgraph_core`].

pub mod config;
pub mod persistence;
pub mod services;
pub mod state;
pub mod supervisor;
pub mod telemetry;
pub mod trip_planner;

pub use services::AgentServices;
pub use state::{format_messages, Route, TripDetails, TripState, TripStateUpdate};
pub use supervisor::build_supervisor;
pub use trip_planner::build_trip_planner;
