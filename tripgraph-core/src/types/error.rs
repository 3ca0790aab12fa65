use async_openai::error::OpenAIError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Failure taxonomy shared by every node, tool handler and model call.
///
/// Only variants reporting [`AgentError::is_retryable`] take part in automatic
/// retries.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum AgentError {
    #[error("{0}")]
    Routing(String),

    #[error("{0}")]
    Classification(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NoToolCalls(String),

    #[error("Tool {tool}: No handler registered for tool: {tool}")]
    ToolNotRegistered { tool: String },

    #[error("Tool {tool}: Invalid arguments for tool {tool}: {message}")]
    ToolArgumentInvalid { tool: String, message: String },

    #[error("Tool {tool}: {message}")]
    ToolExecution {
        tool: String,
        message: String,
        retryable: bool,
        /// Handler-specific failure code, e.g. `NETWORK_ERROR`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    #[error("{message}")]
    Llm {
        message: String,
        retryable: bool,
        status_code: Option<u16>,
    },

    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    #[error("Failed to create LLM instance: {0}")]
    ModelCreation(String),

    #[error("{message}")]
    Persistence { message: String, retryable: bool },

    #[error("{0}")]
    Timeout(String),

    #[error("Circuit breaker is OPEN")]
    CircuitOpen,

    #[error("{message}")]
    Unknown { message: String, code: String },
}

impl AgentError {
    pub fn unknown(message: impl Into<String>) -> Self {
        AgentError::Unknown {
            message: message.into(),
            code: UNKNOWN_ERROR.to_string(),
        }
    }

    pub fn tool_execution(
        tool: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        AgentError::ToolExecution {
            tool: tool.into(),
            message: message.into(),
            retryable,
            reason: None,
        }
    }

    /// Attaches a handler-specific code to a tool execution failure.
    pub fn with_reason(self, code: impl Into<String>) -> Self {
        match self {
            AgentError::ToolExecution {
                tool,
                message,
                retryable,
                ..
            } => AgentError::ToolExecution {
                tool,
                message,
                retryable,
                reason: Some(code.into()),
            },
            other => other,
        }
    }

    /// The most specific code available: a tool's own reason, else [`Self::code`].
    pub fn detail_code(&self) -> &str {
        match self {
            AgentError::ToolExecution {
                reason: Some(reason),
                ..
            } => reason,
            other => other.code(),
        }
    }

    pub fn persistence(message: impl Into<String>, retryable: bool) -> Self {
        AgentError::Persistence {
            message: message.into(),
            retryable,
        }
    }

    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &str {
        match self {
            AgentError::Routing(_) => "ROUTING_ERROR",
            AgentError::Classification(_) => "CLASSIFICATION_ERROR",
            AgentError::Validation(_) => "VALIDATION_ERROR",
            AgentError::NoToolCalls(_) => "NO_TOOL_CALLS_ERROR",
            AgentError::ToolNotRegistered { .. }
            | AgentError::ToolArgumentInvalid { .. }
            | AgentError::ToolExecution { .. } => "TOOL_EXECUTION_ERROR",
            AgentError::Llm { .. } => "LLM_ERROR",
            AgentError::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            AgentError::ModelCreation(_) => "LLM_CREATION_ERROR",
            AgentError::Persistence { .. } => "DATABASE_ERROR",
            AgentError::Timeout(_) => "TIMEOUT_ERROR",
            AgentError::CircuitOpen => "CIRCUIT_BREAKER_OPEN",
            AgentError::Unknown { code, .. } => code.as_str(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Routing(_)
            | AgentError::Classification(_)
            | AgentError::NoToolCalls(_)
            | AgentError::Timeout(_) => true,
            AgentError::ToolExecution { retryable, .. }
            | AgentError::Llm { retryable, .. }
            | AgentError::Persistence { retryable, .. } => *retryable,
            AgentError::Validation(_)
            | AgentError::ToolNotRegistered { .. }
            | AgentError::ToolArgumentInvalid { .. }
            | AgentError::UnsupportedProvider(_)
            | AgentError::ModelCreation(_)
            | AgentError::CircuitOpen
            | AgentError::Unknown { .. } => false,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            AgentError::Llm { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Tags an untyped failure with the name of the operation it escaped from.
    ///
    /// Errors that already belong to a specific category are returned as-is;
    /// only `Unknown` errors still carrying the generic code are re-coded to
    /// `<CONTEXT>_ERROR`.
    pub fn in_context(self, context: &str) -> Self {
        match self {
            AgentError::Unknown { message, code } if code == UNKNOWN_ERROR => AgentError::Unknown {
                message,
                code: format!("{}_ERROR", context.to_uppercase()),
            },
            other => other,
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        // Preserve taxonomy errors that were wrapped by `anyhow` on the way up.
        match err.downcast::<AgentError>() {
            Ok(agent_error) => agent_error,
            Err(err) => AgentError::unknown(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::unknown(err.to_string())
    }
}

impl From<OpenAIError> for AgentError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Reqwest(inner) => AgentError::Llm {
                message: inner.to_string(),
                retryable: true,
                status_code: inner.status().map(|status| status.as_u16()),
            },
            OpenAIError::ApiError(api) => AgentError::Llm {
                message: api.message,
                retryable: true,
                status_code: None,
            },
            OpenAIError::InvalidArgument(message) => AgentError::Llm {
                message,
                retryable: false,
                status_code: None,
            },
            other => AgentError::Llm {
                message: other.to_string(),
                retryable: true,
                status_code: None,
            },
        }
    }
}

/// Errors raised by the graph runtime itself.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Recursion limit of {0} reached without hitting END")]
    RecursionLimit(usize),

    // Node failures bubble up with their taxonomy intact
    #[error(transparent)]
    Node(#[from] AgentError),
}

impl From<GraphError> for AgentError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Node(inner) => inner,
            other => AgentError::Unknown {
                message: other.to_string(),
                code: "SUBGRAPH_ERROR".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_matrix() {
        assert!(AgentError::Routing("x".into()).is_retryable());
        assert!(AgentError::Classification("x".into()).is_retryable());
        assert!(AgentError::Timeout("x".into()).is_retryable());
        assert!(AgentError::NoToolCalls("x".into()).is_retryable());
        assert!(!AgentError::Validation("x".into()).is_retryable());
        assert!(!AgentError::CircuitOpen.is_retryable());
        assert!(!AgentError::unknown("x").is_retryable());
        assert!(!AgentError::ToolNotRegistered { tool: "x".into() }.is_retryable());
        assert!(AgentError::tool_execution("x", "boom", true).is_retryable());
        assert!(!AgentError::tool_execution("x", "boom", false).is_retryable());
    }

    #[test]
    fn test_in_context_only_retags_unknown() {
        let err = AgentError::unknown("boom").in_context("route-user-query");
        assert_eq!(err.code(), "ROUTE-USER-QUERY_ERROR");
        assert_eq!(err.to_string(), "boom");

        // already categorized errors keep their code
        let err = AgentError::Validation("bad".into()).in_context("extract-trip-details");
        assert_eq!(err.code(), "VALIDATION_ERROR");

        // and a second tag does not overwrite the first
        let err = AgentError::unknown("boom").in_context("inner").in_context("outer");
        assert_eq!(err.code(), "INNER_ERROR");
    }

    #[test]
    fn test_anyhow_round_trip_keeps_taxonomy() {
        let wrapped = anyhow::Error::new(AgentError::CircuitOpen);
        assert_eq!(AgentError::from(wrapped), AgentError::CircuitOpen);

        let plain = anyhow::anyhow!("plain failure");
        assert_eq!(AgentError::from(plain).code(), "UNKNOWN_ERROR");
    }

    #[test]
    fn test_subgraph_error_unwraps_node_failure() {
        let err: AgentError = GraphError::Node(AgentError::Routing("no route".into())).into();
        assert_eq!(err, AgentError::Routing("no route".into()));

        let err: AgentError = GraphError::NodeNotFound("ghost".into()).into();
        assert_eq!(err.code(), "SUBGRAPH_ERROR");
    }

    #[test]
    fn test_tool_error_messages() {
        let err = AgentError::ToolNotRegistered {
            tool: "fly-to-moon".into(),
        };
        assert_eq!(
            err.to_string(),
            "Tool fly-to-moon: No handler registered for tool: fly-to-moon"
        );
    }

    #[test]
    fn test_reason_refines_tool_failures_only() {
        let err = AgentError::tool_execution("book-flight", "Network connection failed.", true)
            .with_reason("NETWORK_ERROR");
        assert_eq!(err.code(), "TOOL_EXECUTION_ERROR");
        assert_eq!(err.detail_code(), "NETWORK_ERROR");
        assert_eq!(err.to_string(), "Tool book-flight: Network connection failed.");

        let plain = AgentError::tool_execution("book-flight", "oops", false);
        assert_eq!(plain.detail_code(), "TOOL_EXECUTION_ERROR");

        let timeout = AgentError::Timeout("late".into()).with_reason("IGNORED");
        assert_eq!(timeout.detail_code(), "TIMEOUT_ERROR");
    }
}
