use crate::resilience::RetryOptions;
use std::time::Duration;

/// Execution policy the graph runtime applies around a node.
///
/// The default is a single attempt with no timeout.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Retry policy; `None` runs the node once
    pub retry: Option<RetryOptions>,
    /// Budget for the whole retry sequence
    pub timeout: Option<Duration>,
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
