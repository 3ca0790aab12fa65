//! Retry, timeout and circuit breaking around fallible async operations.
//!
//! Every model call and tool handler in the system runs through
//! [`safe_execute`], which composes [`with_retry`] inside [`with_timeout`] so
//! the timeout bounds the whole retry sequence rather than each attempt.
//! Tool handlers go through [`safe_execute_detached`] instead, where a timeout
//! abandons the result but lets the work finish.

mod circuit_breaker;
mod retry;
mod safe_execute;
mod timeout;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use retry::{with_retry, RetryCondition, RetryOptions};
pub use safe_execute::{safe_execute, safe_execute_detached, Fallback, SafeExecuteOptions};
pub use timeout::{with_detached_timeout, with_timeout};
