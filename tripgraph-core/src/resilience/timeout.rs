use crate::AgentError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Races `operation` against a timer.
///
/// If the timer wins the operation is dropped, which stops it at its next
/// await point, and a retryable `TIMEOUT_ERROR` is returned. Use this for
/// borrowed work without side effects, such as a model request.
pub async fn with_timeout<T, Fut>(
    operation: Fut,
    timeout: Duration,
    message: impl Into<String>,
) -> Result<T, AgentError>
where
    Fut: Future<Output = Result<T, AgentError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(outcome) => outcome,
        Err(_) => Err(AgentError::Timeout(message.into())),
    }
}

/// Runs `operation` on its own task and races the task against a timer.
///
/// A timeout only discards the result: the task keeps running to completion,
/// so whatever it writes still lands. Operations guarded this way must be
/// safe to complete after the caller has given up on them.
pub async fn with_detached_timeout<T, Fut>(
    operation: Fut,
    timeout: Duration,
    message: impl Into<String>,
) -> Result<T, AgentError>
where
    Fut: Future<Output = Result<T, AgentError>> + Send + 'static,
    T: Send + 'static,
{
    let mut task = tokio::spawn(operation);
    match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(AgentError::unknown(format!(
            "Operation task failed: {join_error}"
        ))),
        Err(_) => {
            let message = message.into();
            warn!(%message, "Timed out, operation left to finish in the background");
            Err(AgentError::Timeout(message))
        }
    }
}
