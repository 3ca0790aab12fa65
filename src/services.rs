use crate::config::{AgentConfig, ConfigCache};
use crate::persistence::{BookingStore, InMemoryBookingStore};
use crate::trip_planner::tools::{build_registry, SimulationProfile, TripToolRegistry};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tripgraph_core::completion::{ModelBuilder, OpenAiModelBuilder};
use tripgraph_core::tool::ToolDefaults;
use tripgraph_core::{AgentError, CircuitBreaker, ModelFactory, RetryOptions};

/// Process-scoped dependencies handed to every node.
///
/// Owns the configuration cache, the model factory (with its circuit breaker
/// and client cache), the tool registry and the booking store.
pub struct AgentServices {
    config: ConfigCache,
    models: ModelFactory,
    tools: TripToolRegistry,
    bookings: Arc<dyn BookingStore>,
}

impl AgentServices {
    pub fn new(
        config: ConfigCache,
        builder: Arc<dyn ModelBuilder>,
        bookings: Arc<dyn BookingStore>,
    ) -> Result<Self, AgentError> {
        let settings = config.get().map_err(config_error)?;

        let breaker = Arc::new(CircuitBreaker::new(&settings.circuit_breaker));
        let models = ModelFactory::new(settings.model.clone(), builder, breaker).with_logging(
            settings.logging.enable_request_logging,
            settings.logging.enable_performance_logging,
        );

        let defaults = ToolDefaults {
            timeout: settings.database.timeout(),
            retry: RetryOptions::from(&settings.retry),
        };
        let tools = build_registry(
            defaults,
            Arc::clone(&bookings),
            SimulationProfile::new(settings.simulation.clone()),
        );

        info!(tools = tools.registered_tools().len(), "Agent services ready");
        Ok(Self {
            config,
            models,
            tools,
            bookings,
        })
    }

    /// OpenAI models and an in-memory booking store.
    pub fn from_env(config_path: Option<PathBuf>) -> Result<Self, AgentError> {
        Self::new(
            ConfigCache::new(config_path),
            Arc::new(OpenAiModelBuilder),
            Arc::new(InMemoryBookingStore::new()),
        )
    }

    pub fn config(&self) -> Result<Arc<AgentConfig>, AgentError> {
        self.config.get().map_err(config_error)
    }

    /// Default retry policy with a node-specific retry budget.
    pub fn retry_options(&self, max_retries: u32) -> Result<RetryOptions, AgentError> {
        Ok(RetryOptions::from(&self.config()?.retry).max_retries(max_retries))
    }

    pub fn models(&self) -> &ModelFactory {
        &self.models
    }

    pub fn tools(&self) -> &TripToolRegistry {
        &self.tools
    }

    pub fn bookings(&self) -> &Arc<dyn BookingStore> {
        &self.bookings
    }

    /// Clears the configuration cache, the model cache and the circuit breaker.
    pub fn reset(&self) {
        self.config.reset();
        self.models.clear_cache();
        self.models.breaker().reset();
        info!("Agent services reset");
    }
}

fn config_error(err: crate::config::ConfigError) -> AgentError {
    AgentError::Unknown {
        message: err.to_string(),
        code: "CONFIGURATION_ERROR".to_string(),
    }
}

impl fmt::Debug for AgentServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentServices")
            .field("config", &self.config)
            .field("models", &self.models)
            .field("tools", &self.tools)
            .finish()
    }
}
