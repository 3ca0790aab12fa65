use crate::services::AgentServices;
use crate::state::{format_messages, Route, TripState, TripStateUpdate};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tripgraph_core::prelude::*;

pub const ROUTER_NODE: &str = "router";

const CONTEXT: &str = "route-user-query";
const MAX_RETRIES: u32 = 2;

/// What each specialist handles, as shown to the router model.
pub const ROUTE_DESCRIPTIONS: &str = "tripPlanner: helps the user plan their trip. It can show flight itineraries, book and cancel flights, and also suggest accommodations to stay in any given location.
- generalInput: handles all other cases where the above tools don't apply";

const SYSTEM_PROMPT: &str = r#"You are a friendly and intelligent travel concierge AI, dedicated to helping users plan amazing trips!

Your role is to carefully analyze what the user is asking for and route their request to the most appropriate specialist:

Trip Planner: For anything related to travel planning, flights, accommodations, bookings, or travel advice
General Input: For general questions, greetings, or topics unrelated to travel

Understand the user's intent and connect them to the specialist who can best assist them."#;

#[derive(Debug, Deserialize)]
struct RouteDecision {
    route: Route,
}

fn router_tool() -> ToolSchema {
    ToolSchema::new(
        "router",
        "A tool to route the user's query to the appropriate tool.",
        json!({
            "type": "object",
            "properties": {
                "route": {
                    "type": "string",
                    "enum": [Route::TripPlanner.as_str(), Route::GeneralInput.as_str()],
                    "description": format!(
                        "The route to take based on the user's input.\n{ROUTE_DESCRIPTIONS}\n"
                    ),
                }
            },
            "required": ["route"],
        }),
    )
}

fn human_prompt(messages: &[Message]) -> String {
    let (previous, last) = match messages.split_last() {
        Some((last, previous)) => (format_messages(previous), format_messages(std::slice::from_ref(last))),
        None => (String::new(), String::new()),
    };
    format!(
        "Here is the full conversation, excluding the most recent message:\n\n{previous}\n\n\
         Here is the most recent message:\n\n{last}\n\n\
         Please pick the proper route based on the most recent message, in the context of the entire conversation."
    )
}

/// Picks the branch that handles the latest user message.
#[derive(Debug)]
pub struct RouterNode {
    services: Arc<AgentServices>,
}

impl RouterNode {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn route(&self, state: &TripState) -> Result<Route, AgentError> {
        let config = self.services.config()?;
        let model = self.services.models().routing(
            ModelOptions::new()
                .forced_tool(router_tool())
                .timeout(config.model.timeout())
                .tag("supervisor"),
        )?;

        let response = model
            .invoke(&[
                Message::system(SYSTEM_PROMPT),
                Message::human(human_prompt(&state.messages)),
            ])
            .await?;

        let call = response.tool_calls.first().ok_or_else(|| {
            AgentError::Routing("Could not determine route - no tool call found.".to_string())
        })?;
        let decision: RouteDecision = serde_json::from_value(call.args.clone())
            .map_err(|err| AgentError::Routing(format!("Could not determine route - {err}")))?;

        info!(
            route = %decision.route,
            message_count = state.messages.len(),
            "User query routed successfully"
        );
        Ok(decision.route)
    }
}

#[async_trait]
impl Node<TripState> for RouterNode {
    async fn process(&self, _ctx: &Context, state: TripState) -> NodeResult<TripState> {
        info!("Routing user query to appropriate tool");

        let retry = self.services.retry_options(MAX_RETRIES)?;
        let route = safe_execute(CONTEXT, SafeExecuteOptions::new().retry(retry), || {
            self.route(&state)
        })
        .await?;

        Ok(NodeOutput::update(TripStateUpdate::Next(Some(route))))
    }

    fn name(&self) -> &str {
        ROUTER_NODE
    }
}
