use crate::config::SimulationConfig;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;
use tracing::warn;
use tripgraph_core::AgentError;

/// Failure modes injected by the booking simulation. All are retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFailure {
    BookingFailed,
    NetworkError,
    TimeoutError,
}

const FAILURES: [SimulatedFailure; 3] = [
    SimulatedFailure::BookingFailed,
    SimulatedFailure::NetworkError,
    SimulatedFailure::TimeoutError,
];

impl SimulatedFailure {
    pub fn code(&self) -> &'static str {
        match self {
            SimulatedFailure::BookingFailed => "BOOKING_FAILED",
            SimulatedFailure::NetworkError => "NETWORK_ERROR",
            SimulatedFailure::TimeoutError => "TIMEOUT_ERROR",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SimulatedFailure::BookingFailed => {
                "Flight booking failed due to airline system error. Please try again."
            }
            SimulatedFailure::NetworkError => {
                "Network connection failed. Please check your connection and try again."
            }
            SimulatedFailure::TimeoutError => {
                "Request timed out. The airline system may be busy. Please try again."
            }
        }
    }

    pub fn into_error(self, tool: &str) -> AgentError {
        AgentError::tool_execution(tool, self.message(), true).with_reason(self.code())
    }
}

/// Latency and random failure applied before a booking is written.
#[derive(Debug, Clone)]
pub struct SimulationProfile {
    config: SimulationConfig,
}

impl SimulationProfile {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn disabled() -> Self {
        Self::new(SimulationConfig {
            enabled: false,
            ..SimulationConfig::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Draws this attempt's latency and outcome.
    fn draw(&self) -> (Duration, Option<SimulatedFailure>) {
        let mut rng = rand::rng();
        let range = &self.config.latency_range;
        let latency_ms = if range.min_ms >= range.max_ms {
            range.min_ms
        } else {
            rng.random_range(range.min_ms..=range.max_ms)
        };
        let latency = Duration::from_millis(latency_ms);
        let failure = if rng.random::<f64>() * 100.0 < self.config.error_rate {
            FAILURES.choose(&mut rng).copied()
        } else {
            None
        };
        (latency, failure)
    }

    pub async fn run(&self, tool: &str) -> Result<(), AgentError> {
        if !self.config.enabled {
            return Ok(());
        }

        let (latency, failure) = self.draw();
        tokio::time::sleep(latency).await;

        match failure {
            Some(failure) => {
                warn!(tool, code = failure.code(), latency_ms = latency.as_millis() as u64, "Simulated booking failure");
                Err(failure.into_error(tool))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LatencyRange;

    fn profile(error_rate: f64) -> SimulationProfile {
        SimulationProfile::new(SimulationConfig {
            enabled: true,
            latency_range: LatencyRange {
                min_ms: 300,
                max_ms: 1200,
            },
            error_rate,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_stays_in_range() {
        let started = tokio::time::Instant::now();
        profile(0.0).run("book-flight").await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed <= Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_error_rate_always_fails_retryably() {
        for _ in 0..10 {
            let err = profile(100.0).run("book-flight").await.unwrap_err();
            assert!(err.is_retryable());
            let failure = FAILURES
                .iter()
                .find(|failure| err.to_string().ends_with(failure.message()))
                .unwrap();
            assert_eq!(err.code(), "TOOL_EXECUTION_ERROR");
            assert_eq!(err.detail_code(), failure.code());
        }
    }

    #[tokio::test]
    async fn test_disabled_is_a_no_op() {
        let started = std::time::Instant::now();
        SimulationProfile::disabled().run("book-flight").await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(300));
    }
}
