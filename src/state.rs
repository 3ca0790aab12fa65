use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tripgraph_core::{Message, MessageType, UiMessage};
use tripgraph_macros::State;

/// Trip parameters resolved by the extraction node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub origin: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub number_of_guests: u32,
}

/// Branch picked by the supervisor router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Route {
    #[serde(rename = "tripPlanner")]
    TripPlanner,
    #[serde(rename = "generalInput")]
    GeneralInput,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::TripPlanner => "tripPlanner",
            Route::GeneralInput => "generalInput",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tripPlanner" => Ok(Route::TripPlanner),
            "generalInput" => Ok(Route::GeneralInput),
            other => Err(format!("unknown route: {other}")),
        }
    }
}

/// Conversation state shared by the supervisor and the trip planner.
#[derive(State, Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripState {
    #[update(append)]
    pub messages: Vec<Message>,
    pub trip_details: Option<TripDetails>,
    pub next: Option<Route>,
    #[update(append)]
    pub ui: Vec<UiMessage>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TripState {
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

fn role(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Human => "Human",
        MessageType::Ai => "AI",
        MessageType::System => "System",
        MessageType::Tool => "Tool",
    }
}

/// Renders a transcript as `Role: content` lines for prompts.
pub fn format_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", role(message.message_type), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}
