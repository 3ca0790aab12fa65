use crate::config::CircuitBreakerConfig;
use crate::AgentError;
use serde::Serialize;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
}

/// Fails fast once a protected call-site keeps failing.
///
/// CLOSED counts consecutive failures inside the monitoring window and opens
/// at the threshold. OPEN rejects calls until the cooldown has elapsed, then
/// lets one call through as HALF_OPEN. Any success closes the breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    timeout: Duration,
    monitoring_period: Duration,
    inner: Mutex<BreakerState>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(&CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            timeout: Duration::from_millis(config.timeout_ms),
            monitoring_period: Duration::from_millis(config.monitoring_period_ms),
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
            }),
        }
    }

    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, AgentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        self.acquire()?;
        match operation().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.last_failure = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        // state stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn acquire(&self) -> Result<(), AgentError> {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let cooled_down = inner
            .last_failure
            .map_or(true, |at| at.elapsed() >= self.timeout);
        if cooled_down {
            info!("Circuit breaker moving to HALF_OPEN");
            inner.state = CircuitState::HalfOpen;
            Ok(())
        } else {
            debug!("Circuit breaker OPEN, rejecting call");
            Err(AgentError::CircuitOpen)
        }
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            info!("Circuit breaker recovered, moving to CLOSED");
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        let now = Instant::now();

        let window_expired = inner
            .last_failure
            .map_or(false, |at| now.duration_since(at) > self.monitoring_period);
        if inner.state == CircuitState::Closed && window_expired {
            inner.failures = 0;
        }

        inner.failures += 1;
        inner.last_failure = Some(now);

        match inner.state {
            CircuitState::HalfOpen => {
                warn!(failures = inner.failures, "Circuit breaker probe failed, back to OPEN");
                inner.state = CircuitState::Open;
            }
            CircuitState::Closed if inner.failures >= self.failure_threshold => {
                warn!(
                    failures = inner.failures,
                    threshold = self.failure_threshold,
                    "Circuit breaker OPENING"
                );
                inner.state = CircuitState::Open;
            }
            _ => debug!(
                failures = inner.failures,
                threshold = self.failure_threshold,
                "Circuit breaker recorded failure"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(&CircuitBreakerConfig {
            failure_threshold: threshold,
            timeout_ms,
            ..Default::default()
        })
    }

    async fn fail(breaker: &CircuitBreaker) -> AgentError {
        breaker
            .execute(|| async { Err::<(), _>(AgentError::unknown("down")) })
            .await
            .unwrap_err()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_outside_window_do_not_accumulate() {
        let breaker = CircuitBreaker::new(&CircuitBreakerConfig {
            failure_threshold: 2,
            timeout_ms: 1000,
            monitoring_period_ms: 1000,
        });

        fail(&breaker).await;
        tokio::time::advance(Duration::from_millis(1500)).await;
        fail(&breaker).await;

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let breaker = breaker(1, 1000);
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(fail(&breaker).await.code(), "UNKNOWN_ERROR");
        assert_eq!(breaker.state(), CircuitState::Open);

        // the fresh failure restarts the cooldown
        assert_eq!(fail(&breaker).await, AgentError::CircuitOpen);
    }

    #[tokio::test]
    async fn test_reset_closes_breaker() {
        let breaker = breaker(1, 60_000);
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.execute(|| async { Ok(1) }).await.unwrap(), 1);
    }
}
