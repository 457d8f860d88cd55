//! Tools the analyst agents can call while answering.
//!
//! A tool advertises a JSON-schema definition that is sent with the chat
//! request; when the model asks for it, `ToolRegistry::execute` runs it and
//! the result goes back to the model as a `tool` message.

pub mod stock_data;
pub mod web_search;

pub use stock_data::StockDataTool;
pub use web_search::WebSearchTool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
}

impl PropertySchema {
    pub fn string(description: &str) -> Self {
        Self {
            schema_type: "string".to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            content: format!("Error: {}", message.into()),
        }
    }
}

/// Trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition for the AI API
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the arguments the model supplied
    async fn execute(&self, params: Value) -> ToolResult;
}

/// Tools by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Web search and stock data, sharing one HTTP client.
    pub fn with_builtins(http: reqwest::Client) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WebSearchTool::new(http.clone())));
        registry.register(Arc::new(StockDataTool::new(http)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.definition().name, tool);
    }

    /// Definitions for the named tools, skipping names that are not registered.
    pub fn definitions(&self, names: &[&str]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.tools.get(*name))
            .map(|tool| tool.definition())
            .collect()
    }

    pub async fn execute(&self, name: &str, params: Value) -> ToolResult {
        match self.tools.get(name) {
            Some(tool) => tool.execute(params).await,
            None => ToolResult::error(format!("Unknown tool '{}'", name)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed answer and records the arguments it was called with.
    pub struct EchoTool {
        name: String,
        answer: String,
        calls: Mutex<Vec<Value>>,
    }

    impl EchoTool {
        pub fn new(name: &str, answer: &str) -> Self {
            Self {
                name: name.to_string(),
                answer: answer.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Value> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            let mut properties = HashMap::new();
            properties.insert("query".to_string(), PropertySchema::string("Query"));
            ToolDefinition {
                name: self.name.clone(),
                description: format!("{} for tests", self.name),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["query".to_string()],
                },
            }
        }

        async fn execute(&self, params: Value) -> ToolResult {
            self.calls.lock().unwrap().push(params);
            ToolResult::success(self.answer.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::EchoTool;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_definitions() {
        let registry = ToolRegistry::with_builtins(reqwest::Client::new());
        let defs = registry.definitions(&["web_search", "stock_data", "missing"]);
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["web_search", "stock_data"]);

        let schema = serde_json::to_value(&defs[1].input_schema).unwrap();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["symbol"]));
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let echo = Arc::new(EchoTool::new("echo", "pong"));
        let mut registry = ToolRegistry::new();
        registry.register(echo.clone());

        let result = registry.execute("echo", json!({"query": "ping"})).await;
        assert_eq!(result, ToolResult::success("pong"));
        assert_eq!(echo.calls(), vec![json!({"query": "ping"})]);

        let unknown = registry.execute("nope", json!({})).await;
        assert!(!unknown.success);
        assert_eq!(unknown.content, "Error: Unknown tool 'nope'");
    }
}
