use crate::tool::ToolSchema;
use crate::{AgentError, Message, MessageType, ToolCall};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionNamedToolChoice,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolChoiceOption,
        ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        FunctionCall, FunctionName,
        FunctionObject,
    },
    Client as OpenAIClient,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::ModelSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    Required,
    /// Force a call to the named tool
    Named(String),
}

/// Per-request bindings layered over a base model.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    pub tools: Vec<ToolSchema>,
    pub tool_choice: Option<ToolChoice>,
    pub tags: Vec<String>,
}

/// The black-box language model capability.
///
/// Implementations turn a conversation plus optional tool bindings into one
/// AI message that may carry structured tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<Message, AgentError>;

    fn model_name(&self) -> &str;
}

/// `ChatModel` backed by the OpenAI chat completions API.
pub struct OpenAiChatModel {
    client: OpenAIClient<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiChatModel {
    /// Reads the API key from `OPENAI_API_KEY`.
    pub fn new(settings: &ModelSettings) -> Result<Self, AgentError> {
        Self::with_config(OpenAIConfig::new(), settings)
    }

    pub fn with_config(config: OpenAIConfig, settings: &ModelSettings) -> Result<Self, AgentError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|err| AgentError::ModelCreation(err.to_string()))?;
        let client = OpenAIClient::with_config(config).with_http_client(http_client);

        Ok(Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage, AgentError> {
        let content = message.content.clone();
        let request = match message.message_type {
            MessageType::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()?
                .into(),
            MessageType::Human => ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()?
                .into(),
            MessageType::Ai => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                builder.content(content);
                if !message.tool_calls.is_empty() {
                    let calls = message
                        .tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.args.to_string(),
                            },
                        })
                        .collect::<Vec<_>>();
                    builder.tool_calls(calls);
                }
                builder.build()?.into()
            }
            MessageType::Tool => ChatCompletionRequestToolMessageArgs::default()
                .content(content)
                .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
                .build()?
                .into(),
        };
        Ok(request)
    }

    fn to_tool(schema: &ToolSchema) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: schema.name.clone(),
                description: Some(schema.description.clone()),
                parameters: Some(schema.parameters.clone()),
                strict: None,
            },
        }
    }

    fn build_request(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<CreateChatCompletionRequest, AgentError> {
        let messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(self.model.clone())
            .messages(messages)
            .temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            builder.max_tokens(max_tokens);
        }
        if !options.tools.is_empty() {
            builder.tools(options.tools.iter().map(Self::to_tool).collect::<Vec<_>>());
            if let Some(choice) = &options.tool_choice {
                builder.tool_choice(Self::to_tool_choice(choice));
            }
        }
        Ok(builder.build()?)
    }

    fn to_tool_choice(choice: &ToolChoice) -> ChatCompletionToolChoiceOption {
        match choice {
            ToolChoice::Auto => ChatCompletionToolChoiceOption::Auto,
            ToolChoice::Required => ChatCompletionToolChoiceOption::Required,
            ToolChoice::Named(name) => {
                ChatCompletionToolChoiceOption::Named(ChatCompletionNamedToolChoice {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionName { name: name.clone() },
                })
            }
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<Message, AgentError> {
        let request = self.build_request(messages, options)?;

        debug!(model = %self.model, tags = ?options.tags, "Sending chat completion request");
        let response = self.client.chat().create(request).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| AgentError::Llm {
            message: "Model returned no choices".to_string(),
            retryable: true,
            status_code: None,
        })?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                // keep unparsable arguments so validation can report them
                args: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments)),
            })
            .collect();

        Ok(Message::ai(choice.message.content.unwrap_or_default()).with_tool_calls(tool_calls))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
