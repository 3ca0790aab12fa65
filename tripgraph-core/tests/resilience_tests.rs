use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tripgraph_core::config::CircuitBreakerConfig;
use tripgraph_core::prelude::*;

#[tokio::test(start_paused = true)]
async fn test_retry_backs_off_exponentially_then_gives_up() {
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let options = RetryOptions::new()
        .max_retries(3)
        .base_delay(Duration::from_millis(1000))
        .exponential_backoff(true);

    let result: Result<(), AgentError> = with_retry(&options, || {
        attempts.lock().unwrap().push(Instant::now());
        async { Err(AgentError::Timeout("still busy".into())) }
    })
    .await;

    assert_eq!(
        result.unwrap_err(),
        AgentError::Timeout("still busy".into())
    );

    let attempts = attempts.lock().unwrap();
    assert_eq!(attempts.len(), 4);
    let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_after_transient_failure() {
    let calls = AtomicUsize::new(0);
    let result = with_retry(&RetryOptions::new(), || {
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt == 0 {
                Err(AgentError::tool_execution("book-flight", "airline busy", true))
            } else {
                Ok("ticketed")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "ticketed");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_circuit_breaker_opens_then_recovers() {
    let breaker = CircuitBreaker::new(&CircuitBreakerConfig {
        failure_threshold: 3,
        timeout_ms: 1000,
        ..Default::default()
    });
    let invoked = AtomicUsize::new(0);

    for _ in 0..3 {
        let result: Result<(), _> = breaker
            .execute(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Err(AgentError::unknown("provider down"))
            })
            .await;
        assert!(result.is_err());
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(breaker.failure_count(), 3);

    // rejected without running the operation
    let rejected: Result<(), _> = breaker
        .execute(|| async {
            invoked.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
    let err = rejected.unwrap_err();
    assert_eq!(err.code(), "CIRCUIT_BREAKER_OPEN");
    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "Circuit breaker is OPEN");
    assert_eq!(invoked.load(Ordering::SeqCst), 3);

    tokio::time::advance(Duration::from_millis(1000)).await;

    let recovered = breaker.execute(|| async { Ok::<_, AgentError>("pong") }).await;
    assert_eq!(recovered.unwrap(), "pong");
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_safe_execute_timeout_bounds_whole_retry_loop() {
    let calls = AtomicUsize::new(0);
    let options = SafeExecuteOptions::new()
        .retry(
            RetryOptions::new()
                .max_retries(5)
                .base_delay(Duration::from_millis(400))
                .exponential_backoff(false),
        )
        .timeout(Duration::from_millis(1000));

    let result: Result<(), _> = safe_execute("tool-book-flight", options, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(AgentError::tool_execution("book-flight", "busy", true)) }
    })
    .await;

    // attempts at 0ms, 400ms, 800ms; the timer fires before the fourth
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        result.unwrap_err(),
        AgentError::Timeout("tool-book-flight timed out after 1000ms".into())
    );
}

#[tokio::test]
async fn test_safe_execute_keeps_taxonomy_errors() {
    let result: Result<(), _> = safe_execute(
        "extract-trip-details",
        SafeExecuteOptions::new(),
        || async { Err(AgentError::Validation("Start date must be in the future".into())) },
    )
    .await;

    assert_eq!(
        result.unwrap_err(),
        AgentError::Validation("Start date must be in the future".into())
    );
}
