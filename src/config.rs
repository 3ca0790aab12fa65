//! Agent configuration.
//!
//! Values come from, in increasing priority: built-in defaults, the
//! environment-specific defaults for `environment`, `config/default.toml`, an
//! explicit config file, and `TRIPGRAPH__*` environment variables
//! (`TRIPGRAPH__MODEL__NAME`, `TRIPGRAPH__CIRCUIT_BREAKER__TIMEOUT_MS`, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

pub use tripgraph_core::config::{CircuitBreakerConfig, ModelConfig, ModelProvider, RetryConfig};

const ENV_PREFIX: &str = "TRIPGRAPH";
const DEFAULT_FILE_NAMES: [&str; 2] = ["config/default", "../config/default"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "development" => Some(Environment::Development),
            "test" => Some(Environment::Test),
            "production" => Some(Environment::Production),
            _ => None,
        }
    }

    /// Dotted keys this environment pre-seeds; explicit sources still win.
    fn defaults(&self) -> Vec<(&'static str, config::Value)> {
        match self {
            Environment::Development => Vec::new(),
            Environment::Test => vec![
                ("model.temperature", 0.0.into()),
                ("model.timeout_ms", 5_000i64.into()),
                ("simulation.enabled", false.into()),
                ("logging.level", "error".into()),
                ("retry.max_retries", 1i64.into()),
            ],
            Environment::Production => vec![
                ("model.temperature", 0.1.into()),
                ("model.timeout_ms", 60_000i64.into()),
                ("simulation.enabled", false.into()),
                ("logging.level", "warn".into()),
                ("retry.max_retries", 5i64.into()),
                ("circuit_breaker.failure_threshold", 3i64.into()),
            ],
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for LatencyRange {
    fn default() -> Self {
        Self {
            min_ms: 300,
            max_ms: 1200,
        }
    }
}

/// Artificial latency and failure injected into bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub latency_range: LatencyRange,
    /// Percentage, 0-100
    pub error_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            latency_range: LatencyRange::default(),
            error_rate: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub pool_size: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retries: 3,
            pool_size: None,
        }
    }
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub enable_request_logging: bool,
    pub enable_performance_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_request_logging: true,
            enable_performance_logging: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: ModelConfig,
    pub simulation: SimulationConfig,
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub logging: LoggingConfig,
    pub environment: Environment,
}

impl AgentConfig {
    /// Loads from the default file locations, `path` and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(path, None)
    }

    /// Like [`AgentConfig::load`], reading `TRIPGRAPH__*` variables from `vars`
    /// instead of the process environment when given.
    pub fn load_from(
        path: Option<&Path>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        // First pass only decides which environment defaults to seed.
        let probe = sources(config::Config::builder(), path, vars.clone()).build()?;
        let environment = match probe.get_string("environment") {
            Ok(value) => Environment::parse(&value)
                .ok_or_else(|| ConfigError::invalid("environment", format!("unknown environment: {value}")))?,
            Err(_) => Environment::default(),
        };

        let mut builder = config::Config::builder();
        for (key, value) in environment.defaults() {
            builder = builder.set_default(key, value)?;
        }
        let config: AgentConfig = sources(builder, path, vars).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::invalid("model.temperature", "must be between 0 and 2"));
        }
        if !(0.0..=100.0).contains(&self.simulation.error_rate) {
            return Err(ConfigError::invalid(
                "simulation.error_rate",
                "must be between 0 and 100",
            ));
        }
        if self.simulation.latency_range.min_ms > self.simulation.latency_range.max_ms {
            return Err(ConfigError::invalid(
                "simulation.latency_range",
                "min_ms must not exceed max_ms",
            ));
        }
        if self.retry.max_retries > 10 {
            return Err(ConfigError::invalid("retry.max_retries", "must be at most 10"));
        }
        if self.database.retries > 10 {
            return Err(ConfigError::invalid("database.retries", "must be at most 10"));
        }
        if self.circuit_breaker.failure_threshold < 1 {
            return Err(ConfigError::invalid(
                "circuit_breaker.failure_threshold",
                "must be at least 1",
            ));
        }
        if self.circuit_breaker.timeout_ms < 1000 {
            return Err(ConfigError::invalid(
                "circuit_breaker.timeout_ms",
                "must be at least 1000",
            ));
        }
        if self.circuit_breaker.monitoring_period_ms < 1000 {
            return Err(ConfigError::invalid(
                "circuit_breaker.monitoring_period_ms",
                "must be at least 1000",
            ));
        }
        Ok(())
    }
}

fn sources(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
    path: Option<&Path>,
    vars: Option<HashMap<String, String>>,
) -> config::ConfigBuilder<config::builder::DefaultState> {
    if let Some(name) = DEFAULT_FILE_NAMES
        .iter()
        .find(|name| Path::new(&format!("{name}.toml")).exists())
    {
        builder = builder.add_source(config::File::with_name(name).required(false));
    }

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
    }

    builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(vars),
    )
}

type Loader = Box<dyn Fn() -> Result<AgentConfig, ConfigError> + Send + Sync>;

/// Loads the configuration once and hands out shared copies.
pub struct ConfigCache {
    loader: Loader,
    cached: RwLock<Option<Arc<AgentConfig>>>,
}

impl ConfigCache {
    /// Reads files and the process environment on first use.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            loader: Box::new(move || AgentConfig::load(path.as_deref())),
            cached: RwLock::new(None),
        }
    }

    /// Always yields `config`, also after a reset.
    pub fn fixed(config: AgentConfig) -> Self {
        Self {
            loader: Box::new(move || Ok(config.clone())),
            cached: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Result<Arc<AgentConfig>, ConfigError> {
        if let Some(config) = self
            .cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            return Ok(Arc::clone(config));
        }

        let mut cached = self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(config) = cached.as_ref() {
            return Ok(Arc::clone(config));
        }

        let config = Arc::new((self.loader)().map_err(|err| {
            error!(error = %err, "Failed to load agent configuration");
            err
        })?);
        info!(
            environment = %config.environment,
            model_provider = %config.model.provider,
            model_name = %config.model.name,
            simulation_enabled = config.simulation.enabled,
            "Agent configuration loaded successfully"
        );
        *cached = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Drops the cached value; the next `get` reloads.
    pub fn reset(&self) {
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

impl fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigCache")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::load_from(None, vars(&[])).unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.simulation.latency_range.max_ms, 1200);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
    }

    #[test]
    fn test_environment_variables_override() {
        let config = AgentConfig::load_from(
            None,
            vars(&[
                ("TRIPGRAPH__MODEL__NAME", "gpt-4o-mini"),
                ("TRIPGRAPH__SIMULATION__ENABLED", "true"),
                ("TRIPGRAPH__CIRCUIT_BREAKER__FAILURE_THRESHOLD", "7"),
            ]),
        )
        .unwrap();

        assert_eq!(config.model.name, "gpt-4o-mini");
        assert!(config.simulation.enabled);
        assert_eq!(config.circuit_breaker.failure_threshold, 7);
    }

    #[test]
    fn test_production_defaults_yield_to_explicit_values() {
        let config = AgentConfig::load_from(
            None,
            vars(&[
                ("TRIPGRAPH__ENVIRONMENT", "production"),
                ("TRIPGRAPH__RETRY__MAX_RETRIES", "2"),
            ]),
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.model.timeout_ms, 60_000);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        let err = AgentConfig::load_from(None, vars(&[("TRIPGRAPH__MODEL__TEMPERATURE", "3.5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "model.temperature"));

        let err = AgentConfig::load_from(
            None,
            vars(&[("TRIPGRAPH__CIRCUIT_BREAKER__TIMEOUT_MS", "10")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("circuit_breaker.timeout_ms"));

        let err = AgentConfig::load_from(None, vars(&[("TRIPGRAPH__ENVIRONMENT", "staging")]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown environment: staging"));
    }

    #[test]
    fn test_cache_reset() {
        let cache = ConfigCache::fixed(AgentConfig::default());
        assert!(!cache.is_loaded());

        let first = cache.get().unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.reset();
        assert!(!cache.is_loaded());
        let third = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
