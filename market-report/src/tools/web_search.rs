//! Web search through the DuckDuckGo Instant Answer API (no key required).

use super::{PropertySchema, Tool, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";
const MAX_RESULTS: usize = 8;

pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a plain topic or a named group of topics.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl WebSearchTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: SEARCH_ENDPOINT.to_string(),
        }
    }

    async fn search(&self, query: &str) -> Result<String, String> {
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| format!("Search request failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Search request failed: {}", e))?
            .text()
            .await
            .map_err(|e| format!("Failed to read search response: {}", e))?;

        format_results(query, &body)
    }
}

fn flatten<'a>(topics: &'a [RelatedTopic], out: &mut Vec<(&'a str, &'a str)>) {
    for topic in topics {
        match topic {
            RelatedTopic::Topic { text, first_url } => out.push((text.as_str(), first_url.as_str())),
            RelatedTopic::Group { topics } => flatten(topics, out),
        }
    }
}

/// Render an Instant Answer body as a Markdown list the model can cite from.
pub(crate) fn format_results(query: &str, body: &str) -> Result<String, String> {
    let answer: InstantAnswer =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse search response: {}", e))?;

    let mut out = String::new();
    if !answer.abstract_text.is_empty() {
        let heading = if answer.heading.is_empty() {
            query
        } else {
            answer.heading.as_str()
        };
        out.push_str(&format!("**{}**: {}", heading, answer.abstract_text));
        if !answer.abstract_url.is_empty() {
            out.push_str(&format!(" (source: {})", answer.abstract_url));
        }
        out.push('\n');
    }

    let mut topics = Vec::new();
    flatten(&answer.related_topics, &mut topics);
    for (text, url) in topics.into_iter().take(MAX_RESULTS) {
        out.push_str(&format!("- {} ({})\n", text, url));
    }

    if out.is_empty() {
        return Ok(format!("No results found for '{}'", query));
    }
    Ok(out)
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "query".to_string(),
            PropertySchema::string("What to search for, e.g. 'electric bike market 2024'"),
        );

        ToolDefinition {
            name: "web_search".to_string(),
            description: "Search the web and return summaries with source links. Cite the pages you rely on.".to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties,
                required: vec!["query".to_string()],
            },
        }
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: SearchParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };
        if params.query.trim().is_empty() {
            return ToolResult::error("query must not be empty");
        }

        match self.search(params.query.trim()).await {
            Ok(results) => ToolResult::success(results),
            Err(e) => ToolResult::error(e),
        }
    }
}
