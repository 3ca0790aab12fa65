use crate::services::AgentServices;
use crate::state::{format_messages, TripDetails, TripState, TripStateUpdate};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use tripgraph_core::prelude::*;

pub const CLASSIFY_NODE: &str = "classify";

const CONTEXT: &str = "classify-trip-details";
const MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct Classification {
    /// Whether the trip details are still relevant to the user's request.
    is_relevant: bool,
}

fn classify_tool() -> ToolSchema {
    ToolSchema::for_params::<Classification>(
        "classify",
        "A tool to classify whether or not the trip details are still relevant to the user's request.",
    )
}

fn system_prompt(details: &TripDetails) -> String {
    format!(
        r#"You are a thoughtful travel planning assistant.

These trip details are already saved for the user:
 From: {origin} -> To: {destination}
 Dates: {start} to {end}
 Travelers: {guests} guest(s)

Decide whether the user's latest message is still about this same trip.

Mark the trip details as still relevant if the user is:
- Asking about flights, accommodations, or activities for this same trip
- Making changes or asking questions about the current trip
- Continuing the conversation about this journey

Mark them as no longer relevant if the user is:
- Planning a completely different trip (new destination, dates, or travelers)
- Asking about something unrelated to travel
- Starting fresh with new travel plans

Review the latest message in the context of the whole conversation."#,
        origin = details.origin,
        destination = details.destination,
        start = details.start_date.format("%Y-%m-%d"),
        end = details.end_date.format("%Y-%m-%d"),
        guests = details.number_of_guests,
    )
}

/// Clears trip details once the conversation has moved on from them.
#[derive(Debug)]
pub struct ClassifyNode {
    services: Arc<AgentServices>,
}

impl ClassifyNode {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn is_relevant(&self, details: &TripDetails, state: &TripState) -> Result<bool, AgentError> {
        let config = self.services.config()?;
        let model = self.services.models().classification(
            ModelOptions::new()
                .forced_tool(classify_tool())
                .timeout(config.model.timeout())
                .tag("classify")
                .tag("trip-relevance"),
        )?;

        let human = format!(
            "Here is the entire conversation so far:\n{}",
            format_messages(&state.messages)
        );
        let response = model
            .invoke(&[Message::system(system_prompt(details)), Message::human(human)])
            .await?;

        let call = response.tool_calls.first().ok_or_else(|| {
            AgentError::Classification("Could not classify trip details - no tool call found.".to_string())
        })?;
        let classification: Classification = serde_json::from_value(call.args.clone())
            .map_err(|err| AgentError::Classification(format!("Could not classify trip details - {err}")))?;

        info!(
            is_relevant = classification.is_relevant,
            origin = %details.origin,
            destination = %details.destination,
            "Trip details classification completed"
        );
        Ok(classification.is_relevant)
    }
}

#[async_trait]
impl Node<TripState> for ClassifyNode {
    async fn process(&self, _ctx: &Context, state: TripState) -> NodeResult<TripState> {
        info!("Classifying trip details relevance");

        // nothing to classify yet
        let Some(details) = state.trip_details.as_ref() else {
            return Ok(NodeOutput::none());
        };

        let retry = self.services.retry_options(MAX_RETRIES)?;
        let relevant = safe_execute(CONTEXT, SafeExecuteOptions::new().retry(retry), || {
            self.is_relevant(details, &state)
        })
        .await?;

        if relevant {
            Ok(NodeOutput::none())
        } else {
            Ok(NodeOutput::update(TripStateUpdate::TripDetails(None)))
        }
    }

    fn name(&self) -> &str {
        CLASSIFY_NODE
    }
}
