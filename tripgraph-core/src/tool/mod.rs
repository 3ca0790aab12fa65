mod registry;
mod schema;

pub use registry::{
    RegistryStats, ToolContext, ToolDefaults, ToolExecutionResult, ToolHandler, ToolOptions,
    ToolRegistry, ToolStats,
};
pub use schema::{ToolKind, ToolParams, ToolSchema};
