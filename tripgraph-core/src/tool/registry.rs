use super::schema::{ToolKind, ToolParams, ToolSchema};
use crate::config::RetryConfig;
use crate::resilience::{safe_execute_detached, RetryOptions, SafeExecuteOptions};
use crate::{AgentError, Message, MessageStatus, ToolCall, UiComponent};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

const DEFAULT_ERROR_COMPONENT: &str = "error";

/// What a handler sees besides its arguments.
pub struct ToolContext<'a, S> {
    pub tool_call_id: &'a str,
    pub state: &'a S,
}

impl<S> Clone for ToolContext<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ToolContext<'_, S> {}

/// A typed tool implementation.
#[async_trait]
pub trait ToolHandler<S>: Send + Sync + 'static
where
    S: Send + Sync,
{
    type Params: ToolParams;
    type Output: Serialize + Send + Sync + 'static;

    fn description(&self) -> &str;

    async fn execute(
        &self,
        params: Self::Params,
        ctx: ToolContext<'_, S>,
    ) -> Result<Self::Output, AgentError>;

    /// Props for the success component; defaults to the serialized output.
    fn ui_props(
        &self,
        _params: &Self::Params,
        output: &Self::Output,
        _ctx: ToolContext<'_, S>,
    ) -> Option<Value> {
        serde_json::to_value(output).ok()
    }
}

/// Per-tool execution policy. Unset fields inherit from the next layer
/// (call overrides, then tool options, then registry defaults).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOptions {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub skip_validation: Option<bool>,
    /// UI component pushed on success
    pub component: Option<String>,
    /// UI component pushed on failure, `error` if unset
    pub error_component: Option<String>,
}

impl ToolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = Some(skip);
        self
    }

    pub fn component(mut self, name: impl Into<String>) -> Self {
        self.component = Some(name.into());
        self
    }

    pub fn error_component(mut self, name: impl Into<String>) -> Self {
        self.error_component = Some(name.into());
        self
    }

    fn or(&self, fallback: &ToolOptions) -> ToolOptions {
        ToolOptions {
            timeout: self.timeout.or(fallback.timeout),
            retries: self.retries.or(fallback.retries),
            skip_validation: self.skip_validation.or(fallback.skip_validation),
            component: self.component.clone().or_else(|| fallback.component.clone()),
            error_component: self
                .error_component
                .clone()
                .or_else(|| fallback.error_component.clone()),
        }
    }
}

/// Registry-wide fallbacks: persistence timeout and the global retry policy.
#[derive(Debug, Clone)]
pub struct ToolDefaults {
    pub timeout: Duration,
    pub retry: RetryOptions,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            retry: RetryOptions::from(&RetryConfig::default()),
        }
    }
}

/// Outcome of one tool call. Never an `Err`: failures are carried here so
/// sibling calls keep running.
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    pub tool: String,
    pub tool_call_id: String,
    pub outcome: Result<Value, AgentError>,
    pub messages: Vec<Message>,
    pub ui_components: Vec<UiComponent>,
}

impl ToolExecutionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&AgentError> {
        self.outcome.as_ref().err()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStats {
    pub name: String,
    pub has_schema: bool,
    pub has_options: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_handlers: usize,
    pub handlers: Vec<ToolStats>,
}

struct Success {
    result: Value,
    ui_props: Option<Value>,
}

#[async_trait]
trait ErasedTool<S>: Send + Sync {
    fn description(&self) -> &str;

    fn schema(&self, name: &str) -> ToolSchema;

    async fn run(
        &self,
        call: &ToolCall,
        state: &S,
        options: &ToolOptions,
        defaults: &ToolDefaults,
    ) -> Result<Success, AgentError>;
}

struct TypedTool<H> {
    handler: Arc<H>,
}

#[async_trait]
impl<S, H> ErasedTool<S> for TypedTool<H>
where
    S: Clone + Send + Sync + 'static,
    H: ToolHandler<S>,
{
    fn description(&self) -> &str {
        self.handler.description()
    }

    fn schema(&self, name: &str) -> ToolSchema {
        ToolSchema::for_params::<H::Params>(name, self.handler.description())
    }

    async fn run(
        &self,
        call: &ToolCall,
        state: &S,
        options: &ToolOptions,
        defaults: &ToolDefaults,
    ) -> Result<Success, AgentError> {
        let invalid = |message: String| AgentError::ToolArgumentInvalid {
            tool: call.name.clone(),
            message,
        };

        let params: H::Params =
            serde_json::from_value(call.args.clone()).map_err(|err| invalid(err.to_string()))?;
        if !options.skip_validation.unwrap_or(false) {
            params.validate().map_err(invalid)?;
        }

        let retry = defaults
            .retry
            .clone()
            .max_retries(options.retries.unwrap_or(defaults.retry.max_retries));
        let timeout = options.timeout.unwrap_or(defaults.timeout);

        // the handler runs on its own task so a timeout cannot cut a write short
        let handler = Arc::clone(&self.handler);
        let owned_state = Arc::new(state.clone());
        let owned_id: Arc<str> = Arc::from(call.id.as_str());
        let task_params = params.clone();
        let output = safe_execute_detached(
            &format!("tool-{}", call.name),
            SafeExecuteOptions::new().retry(retry).timeout(timeout),
            move || {
                let handler = Arc::clone(&handler);
                let state = Arc::clone(&owned_state);
                let tool_call_id = Arc::clone(&owned_id);
                let params = task_params.clone();
                async move {
                    let ctx = ToolContext {
                        tool_call_id: &*tool_call_id,
                        state: &*state,
                    };
                    handler.execute(params, ctx).await
                }
            },
        )
        .await?;

        let ctx = ToolContext {
            tool_call_id: &call.id,
            state,
        };

        Ok(Success {
            result: serde_json::to_value(&output)?,
            ui_props: self.handler.ui_props(&params, &output, ctx),
        })
    }
}

struct RegisteredTool<S> {
    tool: Box<dyn ErasedTool<S>>,
    options: ToolOptions,
}

/// Dispatch table from tool kind to typed handler.
pub struct ToolRegistry<K, S> {
    handlers: HashMap<K, RegisteredTool<S>>,
    defaults: ToolDefaults,
}

impl<K, S> ToolRegistry<K, S>
where
    K: ToolKind,
    S: Clone + Send + Sync + 'static,
{
    pub fn new(defaults: ToolDefaults) -> Self {
        Self {
            handlers: HashMap::new(),
            defaults,
        }
    }

    pub fn register<H>(&mut self, kind: K, handler: H, options: ToolOptions) -> &mut Self
    where
        H: ToolHandler<S>,
    {
        self.handlers.insert(
            kind,
            RegisteredTool {
                tool: Box::new(TypedTool {
                    handler: Arc::new(handler),
                }),
                options,
            },
        );
        debug!(tool = %kind, "Registered tool handler");
        self
    }

    pub fn unregister(&mut self, kind: K) -> bool {
        let removed = self.handlers.remove(&kind).is_some();
        if removed {
            debug!(tool = %kind, "Unregistered tool handler");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
        debug!("Cleared all tool handlers");
    }

    pub fn is_registered(&self, kind: K) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn registered_tools(&self) -> Vec<K> {
        let mut kinds: Vec<K> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.to_string());
        kinds
    }

    /// Schemas of every registered tool, ordered by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.registered_tools()
            .into_iter()
            .filter_map(|kind| {
                self.handlers
                    .get(&kind)
                    .map(|registered| registered.tool.schema(&kind.to_string()))
            })
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let handlers = self
            .registered_tools()
            .into_iter()
            .filter_map(|kind| {
                self.handlers.get(&kind).map(|registered| ToolStats {
                    name: kind.to_string(),
                    has_schema: true,
                    has_options: registered.options != ToolOptions::default(),
                })
            })
            .collect();
        RegistryStats {
            total_handlers: self.handlers.len(),
            handlers,
        }
    }

    pub async fn execute(&self, call: &ToolCall, state: &S) -> ToolExecutionResult {
        self.execute_with(call, state, &ToolOptions::default()).await
    }

    /// Executes one call; `overrides` win over the tool's own options.
    pub async fn execute_with(
        &self,
        call: &ToolCall,
        state: &S,
        overrides: &ToolOptions,
    ) -> ToolExecutionResult {
        info!(tool = %call.name, tool_call_id = %call.id, args = %call.args, "Executing tool");

        let registered = call
            .name
            .parse::<K>()
            .ok()
            .and_then(|kind| self.handlers.get(&kind));
        let Some(registered) = registered else {
            let err = AgentError::ToolNotRegistered {
                tool: call.name.clone(),
            };
            return Self::failure(call, err, overrides);
        };

        let options = overrides.or(&registered.options);
        match registered
            .tool
            .run(call, state, &options, &self.defaults)
            .await
        {
            Ok(success) => {
                info!(tool = %call.name, tool_call_id = %call.id, "Tool executed successfully");
                Self::success(call, success, &options)
            }
            Err(err) => {
                error!(tool = %call.name, tool_call_id = %call.id, error = %err, "Tool execution failed");
                Self::failure(call, err, &options)
            }
        }
    }

    /// Runs every call concurrently and collects all results in input order.
    pub async fn execute_many(&self, calls: &[ToolCall], state: &S) -> Vec<ToolExecutionResult> {
        join_all(calls.iter().map(|call| self.execute(call, state))).await
    }

    fn tool_call_id(call: &ToolCall) -> String {
        if call.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            call.id.clone()
        }
    }

    fn success(call: &ToolCall, success: Success, options: &ToolOptions) -> ToolExecutionResult {
        let tool_call_id = Self::tool_call_id(call);
        let message = Message::tool(&tool_call_id, success.result.to_string())
            .hidden()
            .with_status(MessageStatus::Success);

        let ui_components = match (&options.component, success.ui_props) {
            (Some(name), Some(props)) => vec![UiComponent::new(name.clone(), props)],
            _ => Vec::new(),
        };

        ToolExecutionResult {
            tool: call.name.clone(),
            tool_call_id,
            outcome: Ok(success.result),
            messages: vec![message],
            ui_components,
        }
    }

    fn failure(call: &ToolCall, err: AgentError, options: &ToolOptions) -> ToolExecutionResult {
        let tool_call_id = Self::tool_call_id(call);
        let message = Message::tool(&tool_call_id, format!("Tool execution failed: {}", err))
            .hidden()
            .with_status(MessageStatus::Error);

        let component = options
            .error_component
            .clone()
            .unwrap_or_else(|| DEFAULT_ERROR_COMPONENT.to_string());
        let props = json!({
            "error": err.to_string(),
            "code": err.detail_code(),
            "retryable": err.is_retryable(),
            "toolName": call.name,
            "toolId": tool_call_id,
            "timestamp": Utc::now().to_rfc3339(),
        });

        ToolExecutionResult {
            tool: call.name.clone(),
            tool_call_id,
            outcome: Err(err),
            messages: vec![message],
            ui_components: vec![UiComponent::new(component, props)],
        }
    }
}

impl<K: ToolKind, S> Debug for ToolRegistry<K, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut tools: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        tools.sort();
        f.debug_struct("ToolRegistry")
            .field("tools", &tools)
            .field("defaults", &self.defaults)
            .finish()
    }
}
