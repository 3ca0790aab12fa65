use super::{with_detached_timeout, with_retry, with_timeout, RetryOptions};
use crate::AgentError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Boxed producer of a degraded result.
pub type Fallback<T> = Box<dyn FnOnce() -> T + Send>;

pub struct SafeExecuteOptions<T> {
    pub retry: Option<RetryOptions>,
    pub timeout: Option<Duration>,
    pub fallback: Option<Fallback<T>>,
}

impl<T> Default for SafeExecuteOptions<T> {
    fn default() -> Self {
        Self {
            retry: None,
            timeout: None,
            fallback: None,
        }
    }
}

impl<T> SafeExecuteOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry(mut self, retry: RetryOptions) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

/// Standard wrapper for every node and tool handler.
///
/// Retry wraps the operation and the timeout wraps the whole retry loop. A
/// terminal failure is logged, then either replaced by the fallback or
/// returned tagged with `context`.
pub async fn safe_execute<T, F, Fut>(
    context: &str,
    options: SafeExecuteOptions<T>,
    mut operation: F,
) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    let SafeExecuteOptions {
        retry,
        timeout,
        fallback,
    } = options;

    let retried = async {
        match &retry {
            Some(retry) => with_retry(retry, &mut operation).await,
            None => operation().await,
        }
    };

    let outcome = match timeout {
        Some(timeout) => with_timeout(retried, timeout, timeout_message(context, timeout)).await,
        None => retried.await,
    };

    settle(context, outcome, fallback)
}

/// [`safe_execute`] for owned operations with side effects.
///
/// The retry loop runs on its own task, so a timeout discards the result
/// without cutting the loop short. An attempt in flight when the timer fires
/// may still commit.
pub async fn safe_execute_detached<T, F, Fut>(
    context: &str,
    options: SafeExecuteOptions<T>,
    mut operation: F,
) -> Result<T, AgentError>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, AgentError>> + Send,
    T: Send + 'static,
{
    let SafeExecuteOptions {
        retry,
        timeout,
        fallback,
    } = options;

    let retried = async move {
        match &retry {
            Some(retry) => with_retry(retry, &mut operation).await,
            None => operation().await,
        }
    };

    let outcome = match timeout {
        Some(timeout) => {
            with_detached_timeout(retried, timeout, timeout_message(context, timeout)).await
        }
        None => retried.await,
    };

    settle(context, outcome, fallback)
}

fn timeout_message(context: &str, timeout: Duration) -> String {
    format!("{} timed out after {}ms", context, timeout.as_millis())
}

fn settle<T>(
    context: &str,
    outcome: Result<T, AgentError>,
    fallback: Option<Fallback<T>>,
) -> Result<T, AgentError> {
    match outcome {
        Ok(value) => Ok(value),
        Err(err) => {
            error!(context, code = err.code(), error = %err, "Operation failed");
            match fallback {
                Some(fallback) => {
                    warn!(context, "Using fallback result");
                    Ok(fallback())
                }
                None => Err(err.in_context(context)),
            }
        }
    }
}
