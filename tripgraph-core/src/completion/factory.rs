use super::{ChatModel, InvokeOptions, OpenAiChatModel, ToolChoice};
use crate::config::{ModelConfig, ModelProvider, RetryConfig};
use crate::resilience::{with_retry, CircuitBreaker, RetryOptions};
use crate::tool::ToolSchema;
use crate::{AgentError, Message};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Lighter model used for routing decisions.
pub const ROUTING_MODEL: &str = "gpt-4o-mini";

/// Fully resolved settings for one base model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_ms: u64,
    pub streaming: bool,
}

impl ModelSettings {
    /// Cache key covering every field that affects the built client.
    pub fn fingerprint(&self) -> String {
        let max_tokens = self
            .max_tokens
            .map_or_else(|| "none".to_string(), |tokens| tokens.to_string());
        format!(
            "{}-{}-{}-{}-{}-{}",
            self.provider, self.model, self.temperature, max_tokens, self.timeout_ms, self.streaming
        )
    }
}

/// Caller overrides; unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    pub provider: Option<ModelProvider>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
    pub streaming: Option<bool>,
    pub tools: Vec<ToolSchema>,
    pub tool_choice: Option<ToolChoice>,
    pub tags: Vec<String>,
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn provider(mut self, provider: ModelProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = tools;
        self
    }

    /// Binds a single tool and forces the model to call it.
    pub fn forced_tool(mut self, tool: ToolSchema) -> Self {
        self.tool_choice = Some(ToolChoice::Named(tool.name.clone()));
        self.tools = vec![tool];
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    fn with_role(mut self, temperature: f32, tags: &[&str]) -> Self {
        self.temperature.get_or_insert(temperature);
        let mut merged: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
        merged.append(&mut self.tags);
        self.tags = merged;
        self
    }
}

/// Builds base models for a provider.
pub trait ModelBuilder: Send + Sync {
    fn build(&self, settings: &ModelSettings) -> Result<Arc<dyn ChatModel>, AgentError>;
}

/// Supports the `openai` provider only.
#[derive(Debug, Default)]
pub struct OpenAiModelBuilder;

impl ModelBuilder for OpenAiModelBuilder {
    fn build(&self, settings: &ModelSettings) -> Result<Arc<dyn ChatModel>, AgentError> {
        match settings.provider {
            ModelProvider::OpenAi => Ok(Arc::new(OpenAiChatModel::new(settings)?)),
            other => Err(AgentError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

/// A base model with its call-specific bindings, invoked through the
/// factory's circuit breaker.
#[derive(Clone)]
pub struct ConfiguredModel {
    model: Arc<dyn ChatModel>,
    settings: ModelSettings,
    options: InvokeOptions,
    breaker: Arc<CircuitBreaker>,
    log_requests: bool,
    log_performance: bool,
}

impl ConfiguredModel {
    pub async fn invoke(&self, messages: &[Message]) -> Result<Message, AgentError> {
        if self.log_requests {
            info!(
                model = %self.settings.model,
                tags = ?self.options.tags,
                messages = messages.len(),
                tools = self.options.tools.len(),
                "Invoking model"
            );
        }

        let started = Instant::now();
        let response = self
            .breaker
            .execute(|| self.model.invoke(messages, &self.options))
            .await;

        if self.log_performance {
            info!(
                model = %self.settings.model,
                tags = ?self.options.tags,
                elapsed_ms = started.elapsed().as_millis() as u64,
                success = response.is_ok(),
                "Model invocation finished"
            );
        }
        response
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn tags(&self) -> &[String] {
        &self.options.tags
    }

    pub fn tools(&self) -> &[ToolSchema] {
        &self.options.tools
    }

    pub fn tool_choice(&self) -> Option<&ToolChoice> {
        self.options.tool_choice.as_ref()
    }
}

impl Debug for ConfiguredModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredModel")
            .field("settings", &self.settings)
            .field("tags", &self.options.tags)
            .field("tools", &self.options.tools.len())
            .finish()
    }
}

/// Produces role-configured models and caches un-tooled base clients.
pub struct ModelFactory {
    defaults: ModelConfig,
    builder: Arc<dyn ModelBuilder>,
    breaker: Arc<CircuitBreaker>,
    cache: Mutex<HashMap<String, Arc<dyn ChatModel>>>,
    log_requests: bool,
    log_performance: bool,
}

impl ModelFactory {
    pub fn new(defaults: ModelConfig, builder: Arc<dyn ModelBuilder>, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            defaults,
            builder,
            breaker,
            cache: Mutex::new(HashMap::new()),
            log_requests: true,
            log_performance: true,
        }
    }

    pub fn with_logging(mut self, log_requests: bool, log_performance: bool) -> Self {
        self.log_requests = log_requests;
        self.log_performance = log_performance;
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn ChatModel>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn resolve(&self, options: &ModelOptions) -> ModelSettings {
        ModelSettings {
            provider: options.provider.unwrap_or(self.defaults.provider),
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.defaults.name.clone()),
            temperature: options.temperature.unwrap_or(self.defaults.temperature),
            max_tokens: options.max_tokens.or(self.defaults.max_tokens),
            timeout_ms: options
                .timeout
                .map_or(self.defaults.timeout_ms, |timeout| timeout.as_millis() as u64),
            streaming: options.streaming.unwrap_or(false),
        }
    }

    fn build_base(&self, settings: &ModelSettings) -> Result<Arc<dyn ChatModel>, AgentError> {
        self.builder.build(settings).map_err(|err| {
            error!(provider = %settings.provider, error = %err, "Failed to create model instance");
            match err {
                AgentError::UnsupportedProvider(_) | AgentError::ModelCreation(_) => err,
                other => AgentError::ModelCreation(other.to_string()),
            }
        })
    }

    /// Merges `options` over the configured defaults and binds tools and tags.
    ///
    /// Only un-tooled requests consult and fill the cache.
    pub fn create(&self, options: ModelOptions) -> Result<ConfiguredModel, AgentError> {
        let settings = self.resolve(&options);
        let model = if options.tools.is_empty() {
            let key = settings.fingerprint();
            let cached = self.cache().get(&key).cloned();
            match cached {
                Some(model) => {
                    debug!(key = %key, "Model cache hit");
                    model
                }
                None => {
                    let model = self.build_base(&settings)?;
                    self.cache().insert(key, Arc::clone(&model));
                    model
                }
            }
        } else {
            self.build_base(&settings)?
        };

        debug!(
            provider = %settings.provider,
            model = %settings.model,
            temperature = settings.temperature,
            tool_count = options.tools.len(),
            "Created model instance"
        );

        Ok(ConfiguredModel {
            model,
            settings,
            options: InvokeOptions {
                tools: options.tools,
                tool_choice: options.tool_choice,
                tags: options.tags,
            },
            breaker: Arc::clone(&self.breaker),
            log_requests: self.log_requests,
            log_performance: self.log_performance,
        })
    }

    /// Retries creation failures only (2 retries, 1s base delay).
    pub async fn create_with_retry(&self, options: ModelOptions) -> Result<ConfiguredModel, AgentError> {
        let retry = RetryOptions::from(&RetryConfig {
            max_retries: 2,
            base_delay_ms: 1000,
            ..RetryConfig::default()
        })
        .retry_if(|err| matches!(err, AgentError::ModelCreation(_)));

        with_retry(&retry, || {
            let options = options.clone();
            async move { self.create(options) }
        })
        .await
    }

    pub fn classification(&self, options: ModelOptions) -> Result<ConfiguredModel, AgentError> {
        self.create(options.with_role(0.0, &["classification"]))
    }

    pub fn extraction(&self, options: ModelOptions) -> Result<ConfiguredModel, AgentError> {
        self.create(options.with_role(0.0, &["extraction"]))
    }

    pub fn tool_calling(
        &self,
        tools: Vec<ToolSchema>,
        options: ModelOptions,
    ) -> Result<ConfiguredModel, AgentError> {
        self.create(options.tools(tools).with_role(0.0, &["tool-calling"]))
    }

    pub fn routing(&self, mut options: ModelOptions) -> Result<ConfiguredModel, AgentError> {
        options.model.get_or_insert_with(|| ROUTING_MODEL.to_string());
        self.create(options.with_role(0.0, &["routing", "nostream"]))
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
        debug!("Model cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache();
        let mut keys: Vec<String> = cache.keys().cloned().collect();
        keys.sort();
        CacheStats {
            size: cache.len(),
            keys,
        }
    }

    /// Whether credentials for the configured provider are present.
    pub fn validate_api_keys(&self) -> bool {
        match self.defaults.provider {
            ModelProvider::OpenAi => std::env::var("OPENAI_API_KEY").is_ok_and(|key| !key.is_empty()),
            ModelProvider::Anthropic => false,
        }
    }
}

impl Debug for ModelFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFactory")
            .field("defaults", &self.defaults)
            .field("cache", &self.cache_stats())
            .field("breaker", &self.breaker.state())
            .finish()
    }
}
