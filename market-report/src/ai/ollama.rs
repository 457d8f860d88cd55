use crate::ai::Message;
use crate::ai::types::{AiError, AiResponse, ToolCall};
use crate::tools::ToolDefinition;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Client for a local Ollama `/api/chat` endpoint
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OllamaToolFunction,
}

#[derive(Debug, Serialize)]
struct OllamaToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: OllamaFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

impl OllamaClient {
    pub fn new(client: Client, endpoint: Option<&str>, model: Option<&str>) -> Self {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Self {
            client,
            auth_headers,
            endpoint: endpoint
                .unwrap_or("http://localhost:11434/api/chat")
                .to_string(),
            model: model.unwrap_or("llama2:13b").to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, messages: Vec<Message>, tools: &[ToolDefinition]) -> OllamaChatRequest {
        // Ollama matches tool results by position, so tool_call_id is dropped
        let messages = messages
            .into_iter()
            .map(|m| OllamaMessage {
                role: m.role.to_string(),
                content: m.content,
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .into_iter()
                            .map(|call| OllamaToolCall {
                                id: Some(call.id),
                                function: OllamaFunctionCall {
                                    name: call.name,
                                    arguments: call.arguments,
                                },
                            })
                            .collect(),
                    )
                },
            })
            .collect();

        let tools = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| OllamaTool {
                        tool_type: "function".to_string(),
                        function: OllamaToolFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: serde_json::to_value(&t.input_schema)
                                .unwrap_or(Value::Null),
                        },
                    })
                    .collect(),
            )
        };

        OllamaChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            tools,
        }
    }

    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, AiError> {
        let request = self.build_request(messages, tools);

        log::debug!(
            "[OLLAMA] Sending request to {} ({}, {} tools)",
            self.endpoint,
            self.model,
            tools.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.auth_headers.clone())
            .timeout(Duration::from_secs(300))
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::new(format!("Ollama API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::new(format!("Failed to read Ollama response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<OllamaErrorResponse>(&body) {
                return Err(AiError::with_status(
                    format!("Ollama API error: {}", error_response.error),
                    status.as_u16(),
                ));
            }
            return Err(AiError::with_status(
                format!("Ollama API returned error status: {}, body: {}", status, body),
                status.as_u16(),
            ));
        }

        parse_chat_response(&body)
    }
}

pub(crate) fn parse_chat_response(body: &str) -> Result<AiResponse, AiError> {
    let response: OllamaChatResponse = serde_json::from_str(body)
        .map_err(|e| AiError::new(format!("Failed to parse Ollama response: {}", e)))?;

    let message = response.message;
    let tool_calls: Vec<ToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, call)| ToolCall {
            id: call.id.unwrap_or_else(|| format!("call_{}", i)),
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    if message.content.is_empty() && tool_calls.is_empty() {
        return Err(AiError::new("Ollama API returned no content"));
    }

    Ok(AiResponse::with_tools(message.content, tool_calls))
}
