use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tripgraph::config::{AgentConfig, ConfigCache, ConfigError, Environment, LogLevel, ModelProvider};

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    )
}

#[test]
fn test_file_values_are_loaded() {
    let file = toml_file(
        r#"
[model]
provider = "openai"
name = "gpt-4o-mini"
timeout_ms = 15000

[simulation]
enabled = true
error_rate = 25.0

[simulation.latency_range]
min_ms = 50
max_ms = 100

[logging]
level = "debug"
"#,
    );

    let config = AgentConfig::load_from(Some(file.path()), vars(&[])).unwrap();

    assert_eq!(config.model.provider, ModelProvider::OpenAi);
    assert_eq!(config.model.name, "gpt-4o-mini");
    assert_eq!(config.model.timeout_ms, 15_000);
    assert!(config.simulation.enabled);
    assert_eq!(config.simulation.error_rate, 25.0);
    assert_eq!(config.simulation.latency_range.min_ms, 50);
    assert_eq!(config.logging.level, LogLevel::Debug);
    // untouched sections keep their defaults
    assert_eq!(config.retry.max_retries, 3);
}

#[test]
fn test_environment_beats_file() {
    let file = toml_file(
        r#"
[retry]
max_retries = 4
base_delay_ms = 200
"#,
    );

    let config = AgentConfig::load_from(
        Some(file.path()),
        vars(&[("TRIPGRAPH__RETRY__MAX_RETRIES", "1")]),
    )
    .unwrap();

    assert_eq!(config.retry.max_retries, 1);
    assert_eq!(config.retry.base_delay_ms, 200);
}

#[test]
fn test_environment_in_file_selects_its_defaults() {
    let file = toml_file("environment = \"test\"\n");

    let config = AgentConfig::load_from(Some(file.path()), vars(&[])).unwrap();

    assert_eq!(config.environment, Environment::Test);
    assert_eq!(config.logging.level, LogLevel::Error);
    assert!(!config.simulation.enabled);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = AgentConfig::load_from(Some(&missing), vars(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_invalid_file_values_are_rejected() {
    let file = toml_file(
        r#"
[simulation]
error_rate = 150.0
"#,
    );

    let err = AgentConfig::load_from(Some(file.path()), vars(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "simulation.error_rate"));
}

#[test]
fn test_cache_reads_file_once_until_reset() {
    let file = toml_file("[model]\nname = \"gpt-4o-mini\"\n");
    let cache = ConfigCache::new(Some(file.path().to_path_buf()));

    let first = cache.get().unwrap();
    assert_eq!(first.model.name, "gpt-4o-mini");
    assert!(cache.is_loaded());
    assert!(Arc::ptr_eq(&first, &cache.get().unwrap()));

    cache.reset();
    assert!(!cache.is_loaded());
}
