use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A named UI component with free-form props, as produced by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiComponent {
    pub name: String,
    pub props: Value,
}

impl UiComponent {
    pub fn new(name: impl Into<String>, props: Value) -> Self {
        Self {
            name: name.into(),
            props,
        }
    }
}

/// A UI component attached to the AI message that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub id: String,
    pub name: String,
    pub props: Value,
    pub message_id: String,
}

impl UiMessage {
    pub fn for_message(component: UiComponent, message_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: component.name,
            props: component.props,
            message_id: message_id.into(),
        }
    }
}
