use crate::ai::types::{AiError, AiResponse, ToolCall};
use crate::ai::{Message, MessageRole};
use crate::tools::ToolDefinition;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Client for OpenAI-style `/v1/chat/completions` endpoints
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    /// JSON-encoded arguments
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

impl OpenAIClient {
    pub fn new(
        client: Client,
        api_key: &str,
        endpoint: Option<&str>,
        model: Option<&str>,
        max_tokens: u32,
    ) -> Result<Self, String> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        auth_headers.insert(header::AUTHORIZATION, auth_value);

        Ok(Self {
            client,
            auth_headers,
            endpoint: endpoint
                .unwrap_or("https://api.openai.com/v1/chat/completions")
                .to_string(),
            model: model.unwrap_or("gpt-4o").to_string(),
            max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, messages: Vec<Message>, tools: &[ToolDefinition]) -> ChatCompletionRequest {
        let messages = messages.into_iter().map(to_chat_message).collect();

        let tools = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| OpenAITool {
                        tool_type: "function".to_string(),
                        function: OpenAIFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: serde_json::to_value(&t.input_schema)
                                .unwrap_or(Value::Null),
                        },
                    })
                    .collect(),
            )
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
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
            "[OPENAI] Sending request to {} ({}, {} tools)",
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
            .map_err(|e| AiError::new(format!("OpenAI API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::new(format!("Failed to read OpenAI response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&body) {
                return Err(AiError::with_status(
                    format!("OpenAI API error: {}", error_response.error.message),
                    status.as_u16(),
                ));
            }
            return Err(AiError::with_status(
                format!("OpenAI API returned error status: {}, body: {}", status, body),
                status.as_u16(),
            ));
        }

        parse_completion(&body)
    }
}

fn to_chat_message(message: Message) -> ChatMessage {
    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        Some(
            message
                .tool_calls
                .into_iter()
                .map(|call| OpenAIToolCall {
                    id: call.id,
                    call_type: function_type(),
                    function: OpenAIFunctionCall {
                        name: call.name,
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect(),
        )
    };

    // An assistant turn that only calls tools has null content
    let content = if message.role == MessageRole::Assistant
        && message.content.is_empty()
        && tool_calls.is_some()
    {
        None
    } else {
        Some(message.content)
    };

    ChatMessage {
        role: message.role.to_string(),
        content,
        tool_calls,
        tool_call_id: message.tool_call_id,
    }
}

/// Pull the first choice out of a chat-completions response body.
pub(crate) fn parse_completion(body: &str) -> Result<AiResponse, AiError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| AiError::new(format!("Failed to parse OpenAI response: {}", e)))?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| AiError::new("OpenAI API returned no choices"))?;

    let content = message.content.unwrap_or_default();
    let tool_calls: Vec<ToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            // Malformed arguments reach the tool as a string and fail its parameter check
            arguments: serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments)),
        })
        .collect();

    if content.is_empty() && tool_calls.is_empty() {
        return Err(AiError::new("OpenAI API returned no content"));
    }
    Ok(AiResponse::with_tools(content, tool_calls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_takes_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "First"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "Second"}, "finish_reason": "stop"}
            ]
        }"#;
        let response = parse_completion(body).unwrap();
        assert_eq!(response.content, "First");
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn test_parse_completion_reads_tool_calls() {
        let body = r#"{"choices": [{"message": {
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_abc",
                "type": "function",
                "function": {"name": "stock_data", "arguments": "{\"symbol\":\"TSLA\"}"}
            }]
        }, "finish_reason": "tool_calls"}]}"#;

        let response = parse_completion(body).unwrap();
        assert_eq!(response.content, "");
        assert_eq!(
            response.tool_calls,
            vec![ToolCall {
                id: "call_abc".to_string(),
                name: "stock_data".to_string(),
                arguments: serde_json::json!({"symbol": "TSLA"}),
            }]
        );
    }

    #[test]
    fn test_request_carries_tools_and_tool_turns() {
        let client = OpenAIClient::new(Client::new(), "sk-test", None, None, 4096).unwrap();
        let tools = crate::tools::ToolRegistry::with_builtins(Client::new()).definitions(&["web_search"]);
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "web_search".to_string(),
            arguments: serde_json::json!({"query": "e-bikes"}),
        };
        let messages = vec![
            Message::user("news?"),
            Message::assistant_with_tools("", vec![call]),
            Message::tool_result("call_1", "- result"),
        ];

        let json = serde_json::to_value(client.build_request(messages, &tools)).unwrap();

        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "web_search");
        assert_eq!(json["tools"][0]["function"]["parameters"]["type"], "object");
        assert!(json["messages"][1]["content"].is_null());
        assert_eq!(
            json["messages"][1]["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"e-bikes"}"#
        );
        assert_eq!(json["messages"][2]["role"], "tool");
        assert_eq!(json["messages"][2]["tool_call_id"], "call_1");

        let plain = serde_json::to_value(client.build_request(vec![Message::user("hi")], &[])).unwrap();
        assert!(plain.get("tools").is_none());
    }

    #[test]
    fn test_parse_completion_rejects_empty_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert!(parse_completion(body).is_err());
        assert!(parse_completion(r#"{"choices": []}"#).is_err());
    }

    #[test]
    fn test_defaults() {
        let client = OpenAIClient::new(Client::new(), "sk-test", None, None, 4096).unwrap();
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.endpoint, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_rejects_unprintable_key() {
        assert!(OpenAIClient::new(Client::new(), "bad\nkey", None, None, 4096).is_err());
    }
}
