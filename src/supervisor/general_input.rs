use crate::services::AgentServices;
use crate::state::{TripState, TripStateUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use tripgraph_core::prelude::*;

pub const GENERAL_INPUT_NODE: &str = "generalInput";

const CONTEXT: &str = "general-input";

const SYSTEM_PROMPT: &str = "You are a friendly travel concierge. The user's latest message is not about \
planning a trip. Answer it briefly and helpfully, and mention that you can show flight itineraries, \
book or cancel flights, and suggest accommodations whenever they are ready to plan a trip.";

pub const APOLOGY: &str = "I'm sorry, I'm having trouble responding right now. Please try again in a moment.";

/// Conversational answer for anything that is not trip planning.
#[derive(Debug)]
pub struct GeneralInputNode {
    services: Arc<AgentServices>,
}

impl GeneralInputNode {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn respond(&self, state: &TripState) -> Result<Message, AgentError> {
        let config = self.services.config()?;
        let model = self
            .services
            .models()
            .create(ModelOptions::new().timeout(config.model.timeout()).tag("general-input"))?;

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.extend(state.messages.iter().cloned());
        model.invoke(&messages).await
    }
}

#[async_trait]
impl Node<TripState> for GeneralInputNode {
    async fn process(&self, _ctx: &Context, state: TripState) -> NodeResult<TripState> {
        info!("Answering general input");

        let retry = self.services.retry_options(1)?;
        let options = SafeExecuteOptions::new()
            .retry(retry)
            .fallback(|| Message::ai(APOLOGY));
        let response = safe_execute(CONTEXT, options, || self.respond(&state)).await?;

        Ok(NodeOutput::update(TripStateUpdate::Messages(vec![response])))
    }

    fn name(&self) -> &str {
        GENERAL_INPUT_NODE
    }
}
