use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Message ids with this prefix are kept in history but never rendered.
pub const DO_NOT_RENDER_ID_PREFIX: &str = "do-not-render-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Human,
    Ai,
    System,
    Tool,
}

/// Outcome recorded on tool replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
}

impl Message {
    fn with_type(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message_type,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            status: None,
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::Ai, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::System, content)
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_type(MessageType::Tool, content)
        }
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn fresh_id(mut self) -> Self {
        self.id = Uuid::new_v4().to_string();
        self
    }

    /// Re-ids the message so the UI skips it.
    pub fn hidden(mut self) -> Self {
        self.id = format!("{}{}", DO_NOT_RENDER_ID_PREFIX, Uuid::new_v4());
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.id.starts_with(DO_NOT_RENDER_ID_PREFIX)
    }

    /// Looks up the first tool call with the given name.
    pub fn tool_call(&self, name: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|call| call.name == name)
    }
}
