pub mod ollama;
pub mod openai;
pub mod types;

pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use types::{AiError, AiResponse, ToolCall};

use crate::config::{AiProvider, ReportConfig};
use crate::error::ReportError;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };
        f.write_str(role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Calls requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Which call a `tool` message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Echo of an assistant turn that asked for tools, sent back with the results.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(MessageRole::Assistant, content)
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(MessageRole::Tool, content)
        }
    }
}

/// Unified AI client that works with any configured provider
#[derive(Clone)]
pub enum AiClient {
    OpenAI(OpenAIClient),
    Ollama(OllamaClient),
    #[cfg(test)]
    Mock(testing::MockAiClient),
}

impl AiClient {
    /// Create an AI client from the report configuration
    pub fn from_config(config: &ReportConfig, http: reqwest::Client) -> Result<Self, ReportError> {
        match config.provider {
            AiProvider::OpenAI => {
                let api_key = config.api_key.as_deref().ok_or_else(|| {
                    ReportError::Config("OPENAI_API_KEY is not set".to_string())
                })?;
                let client = OpenAIClient::new(
                    http,
                    api_key,
                    config.endpoint.as_deref(),
                    config.model.as_deref(),
                    config.max_tokens,
                )
                .map_err(ReportError::Config)?;
                Ok(AiClient::OpenAI(client))
            }
            AiProvider::Ollama => Ok(AiClient::Ollama(OllamaClient::new(
                http,
                config.endpoint.as_deref(),
                config.model.as_deref(),
            ))),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            AiClient::OpenAI(client) => client.model(),
            AiClient::Ollama(client) => client.model(),
            #[cfg(test)]
            AiClient::Mock(_) => "mock",
        }
    }

    /// Generate a response that may include tool calls. An empty `tools`
    /// slice sends a plain chat request.
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, AiError> {
        match self {
            AiClient::OpenAI(client) => client.generate_with_tools(messages, tools).await,
            AiClient::Ollama(client) => client.generate_with_tools(messages, tools).await,
            #[cfg(test)]
            AiClient::Mock(client) => client.generate_with_tools(messages, tools),
        }
    }
}
