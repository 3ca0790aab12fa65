use super::{ChatModel, InvokeOptions, ModelBuilder, ModelSettings};
use crate::{AgentError, Message, ToolCall};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded `invoke` call.
#[derive(Debug, Clone)]
pub struct ScriptedCall {
    pub messages: Vec<Message>,
    pub options: InvokeOptions,
}

/// Deterministic `ChatModel` that replays queued responses in order.
///
/// Used by tests and the offline chat mode. Running out of responses is a
/// non-retryable `LLM_ERROR`. Every call is recorded unless a history limit is
/// set, in which case only the most recent calls are kept.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<Message, AgentError>>>,
    calls: Mutex<VecDeque<ScriptedCall>>,
    total_calls: AtomicUsize,
    history_limit: Option<usize>,
    fallback: Option<Message>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers with a clone of `message` once the queue is empty.
    pub fn with_fallback(mut self, message: Message) -> Self {
        self.fallback = Some(message);
        self
    }

    /// Keeps at most `limit` recorded calls; zero disables recording.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn push(&self, response: Result<Message, AgentError>) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(response);
        self
    }

    pub fn push_text(&self, content: impl Into<String>) -> &Self {
        self.push(Ok(Message::ai(content)))
    }

    /// Queues an AI message carrying a single tool call.
    pub fn push_tool_call(&self, name: impl Into<String>, args: Value) -> &Self {
        self.push(Ok(Message::ai("").with_tool_calls(vec![ToolCall::new(name, args)])))
    }

    pub fn push_error(&self, err: AgentError) -> &Self {
        self.push(Err(err))
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Number of `invoke` calls so far, recorded or not.
    pub fn call_count(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    fn record(&self, messages: &[Message], options: &InvokeOptions) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if self.history_limit == Some(0) {
            return;
        }

        let mut calls = self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        calls.push_back(ScriptedCall {
            messages: messages.to_vec(),
            options: options.clone(),
        });
        if let Some(limit) = self.history_limit {
            while calls.len() > limit {
                calls.pop_front();
            }
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<Message, AgentError> {
        self.record(messages, options);

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match (next, &self.fallback) {
            (Some(response), _) => response.map(Message::fresh_id),
            (None, Some(fallback)) => Ok(fallback.clone().fresh_id()),
            (None, None) => Err(AgentError::Llm {
                message: "No scripted response left".to_string(),
                retryable: false,
                status_code: None,
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// `ModelBuilder` handing out one shared `ScriptedModel`.
#[derive(Debug, Default)]
pub struct ScriptedBuilder {
    model: Arc<ScriptedModel>,
    builds: Mutex<Vec<ModelSettings>>,
    failures_left: Mutex<u32>,
}

impl ScriptedBuilder {
    pub fn new(model: Arc<ScriptedModel>) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Makes the next `count` builds fail with a creation error.
    pub fn fail_next_builds(self, count: u32) -> Self {
        *self
            .failures_left
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = count;
        self
    }

    pub fn model(&self) -> &Arc<ScriptedModel> {
        &self.model
    }

    /// Settings of every base model built so far.
    pub fn builds(&self) -> Vec<ModelSettings> {
        self.builds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ModelBuilder for ScriptedBuilder {
    fn build(&self, settings: &ModelSettings) -> Result<Arc<dyn ChatModel>, AgentError> {
        {
            let mut failures = self
                .failures_left
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *failures > 0 {
                *failures -= 1;
                return Err(AgentError::ModelCreation("scripted build failure".to_string()));
            }
        }
        self.builds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(settings.clone());
        let model: Arc<dyn ChatModel> = self.model.clone();
        Ok(model)
    }
}
