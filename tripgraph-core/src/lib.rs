//! TripGraph core: a small framework for stateful, multi-step LLM agents.
//!
//! Provides the graph runtime, conversation types, the error taxonomy, the
//! resilience kernel, the model invocation gateway and the tool registry.

#![allow(unused_extern_crates)]
extern crate self as tripgraph_core;

pub mod completion;
pub mod config;
pub mod graph;
pub mod node;
pub mod resilience;
pub mod tool;
pub mod types;

pub mod prelude {
    //! Convenient re-exports of commonly used types
    pub use crate::completion::{
        ChatModel, ConfiguredModel, InvokeOptions, ModelFactory, ModelOptions, ScriptedModel,
        ToolChoice,
    };
    pub use crate::graph::{Built, Condition, Edge, Graph, NotBuilt, END, START};
    pub use crate::node::{Context, FunctionNode, Node, NodeConfig};
    pub use crate::resilience::{
        safe_execute, safe_execute_detached, with_detached_timeout, with_retry, with_timeout,
        CircuitBreaker, CircuitState, RetryOptions, SafeExecuteOptions,
    };
    pub use crate::tool::{
        ToolContext, ToolExecutionResult, ToolHandler, ToolOptions, ToolParams, ToolRegistry,
        ToolSchema,
    };
    pub use crate::types::{
        AgentError, GraphError, GraphResult, GraphState, Message, MessageStatus, MessageType,
        NodeOutput, NodeResult, ToolCall, UiComponent, UiMessage, DO_NOT_RENDER_ID_PREFIX,
    };
}

// Re-export main types
pub use prelude::*;
