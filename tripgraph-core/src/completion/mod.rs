mod client;
mod factory;
mod scripted;

pub use client::{ChatModel, InvokeOptions, OpenAiChatModel, ToolChoice};
pub use factory::{
    CacheStats, ConfiguredModel, ModelBuilder, ModelFactory, ModelOptions, ModelSettings,
    OpenAiModelBuilder, ROUTING_MODEL,
};
pub use scripted::{ScriptedBuilder, ScriptedCall, ScriptedModel};
