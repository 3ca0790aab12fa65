use crate::services::AgentServices;
use crate::state::{TripState, TripStateUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use tripgraph_core::prelude::*;

pub const CALL_TOOLS_NODE: &str = "callTools";

const CONTEXT: &str = "call-tools";
const MAX_RETRIES: u32 = 2;

const SYSTEM_PROMPT: &str = r#"You are an AI travel assistant.

When the user wants to book a flight, you MUST call the "book-flight" tool.
The tool requires:
  - itinerary (the flight itinerary to book)
  - passengerName
  - passengerEmail
Do NOT respond with text only, call the tool. If you don't have all the required information, ask the user for the missing details.

When the user wants to cancel a flight, you MUST call the "cancel-flight" tool.
The tool requires flightId (the ID of the flight to cancel) or pnr (the booking reference).
Do NOT respond with text only, call the tool. If you don't have the flightId or pnr, ask the user for it.

When the user wants to see flight options, you MUST call the "list-flight-itineraries" tool.
Do NOT respond with text only, call the tool.

When the user wants to see accommodation options, you MUST call the "list-accommodations" tool.
Do NOT respond with text only, call the tool.

Always use the tools when relevant."#;

/// Asks the model for trip tool calls and dispatches them.
#[derive(Debug)]
pub struct CallToolsNode {
    services: Arc<AgentServices>,
}

impl CallToolsNode {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn request_tool_calls(&self, state: &TripState) -> Result<Message, AgentError> {
        let config = self.services.config()?;
        let model = self.services.models().tool_calling(
            self.services.tools().schemas(),
            ModelOptions::new()
                .timeout(config.model.timeout())
                .tag("trip-planner"),
        )?;

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.extend(state.messages.iter().cloned());

        let response = model.invoke(&messages).await?;
        if response.tool_calls.is_empty() {
            return Err(AgentError::NoToolCalls("No tool calls found.".to_string()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Node<TripState> for CallToolsNode {
    async fn process(&self, _ctx: &Context, state: TripState) -> NodeResult<TripState> {
        if state.trip_details.is_none() {
            return Err(AgentError::Validation("No trip details found".to_string()));
        }

        let retry = self.services.retry_options(MAX_RETRIES)?;
        let response = safe_execute(CONTEXT, SafeExecuteOptions::new().retry(retry), || {
            self.request_tool_calls(&state)
        })
        .await?;

        info!(
            tool_calls = response.tool_calls.len(),
            "Dispatching trip tool calls"
        );
        let results = self
            .services
            .tools()
            .execute_many(&response.tool_calls, &state)
            .await;

        let failed = results.iter().filter(|result| !result.is_success()).count();
        info!(
            succeeded = results.len() - failed,
            failed, "Trip tool calls finished"
        );

        let mut messages = vec![response.clone()];
        let mut ui = Vec::new();
        for result in results {
            messages.extend(result.messages);
            for component in result.ui_components {
                debug!(component = %component.name, tool_call_id = %result.tool_call_id, "Pushing UI component");
                ui.push(UiMessage::for_message(component, &response.id));
            }
        }

        Ok(NodeOutput::Updates(vec![
            TripStateUpdate::Messages(messages),
            TripStateUpdate::Ui(ui),
            TripStateUpdate::Timestamp(Some(Utc::now())),
        ]))
    }

    fn name(&self) -> &str {
        CALL_TOOLS_NODE
    }
}
