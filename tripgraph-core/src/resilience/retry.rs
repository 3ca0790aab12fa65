use crate::config::RetryConfig;
use crate::AgentError;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Decides whether a failed attempt may be retried.
pub type RetryCondition = Arc<dyn Fn(&AgentError) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_backoff: bool,
    retry_condition: Option<RetryCondition>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryOptions {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            exponential_backoff: config.exponential_backoff,
            retry_condition: None,
        }
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Replaces the default condition (`AgentError::is_retryable`).
    pub fn retry_if<F>(mut self, condition: F) -> Self
    where
        F: Fn(&AgentError) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Some(Arc::new(condition));
        self
    }

    pub fn should_retry(&self, err: &AgentError) -> bool {
        match &self.retry_condition {
            Some(condition) => condition(err),
            None => err.is_retryable(),
        }
    }

    /// Delay to wait after the zero-based `attempt` failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.base_delay;
        }
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Debug for RetryOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("exponential_backoff", &self.exponential_backoff)
            .field("custom_condition", &self.retry_condition.is_some())
            .finish()
    }
}

/// Runs `operation` up to `max_retries + 1` times.
///
/// Returns the last error once attempts are exhausted or as soon as an error
/// fails the retry condition.
pub async fn with_retry<T, F, Fut>(options: &RetryOptions, mut operation: F) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= options.max_retries || !options.should_retry(&err) {
            return Err(err);
        }

        let delay = options.delay_for(attempt);
        warn!(
            attempt = attempt + 1,
            max_retries = options.max_retries,
            delay_ms = delay.as_millis() as u64,
            code = err.code(),
            error = %err,
            "Retrying operation"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
