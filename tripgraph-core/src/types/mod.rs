mod error;
mod message;
mod result;
mod state;
mod ui;

#[cfg(test)]
mod tests;

pub use error::{AgentError, GraphError};
pub use message::{Message, MessageStatus, MessageType, ToolCall, DO_NOT_RENDER_ID_PREFIX};
pub use result::{GraphResult, NodeOutput, NodeResult};
pub use state::GraphState;
pub use ui::{UiComponent, UiMessage};
