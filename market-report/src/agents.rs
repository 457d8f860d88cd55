//! Agent profiles and the `Agent` seam the pipeline talks to.

use crate::ai::{AiClient, AiError, Message};
use crate::tools::{ToolDefinition, ToolRegistry};
use async_trait::async_trait;
use std::sync::Arc;

/// Model turns an agent may spend calling tools before it must answer.
pub const MAX_TOOL_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKey {
    Web,
    TechMarket,
    Finance,
    ValueCapture,
    OrgDesign,
    Team,
}

/// Tools an agent is allowed to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    WebSearch,
    StockData,
}

impl ToolKind {
    /// Name of the registered tool
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "web_search",
            ToolKind::StockData => "stock_data",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "web_search: search the web (cite the pages you rely on)",
            ToolKind::StockData => "stock_data: current price and 52-week range for a ticker",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub key: AgentKey,
    pub name: &'static str,
    pub role: &'static str,
    pub instructions: &'static [&'static str],
    pub tools: &'static [ToolKind],
}

impl AgentProfile {
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(ToolKind::tool_name).collect()
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = format!("You are {}. Your role: {}.\n", self.name, self.role);

        if !self.tools.is_empty() {
            prompt.push_str("\nAvailable tools:\n");
            for tool in self.tools {
                prompt.push_str(&format!("- {}\n", tool.describe()));
            }
        }

        prompt.push_str("\nInstructions:\n");
        for line in self.instructions {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push_str("\nRespond in Markdown.");
        prompt
    }
}

// ===== Built-in profiles =====

pub static WEB_AGENT: AgentProfile = AgentProfile {
    key: AgentKey::Web,
    name: "Web Agent",
    role: "Search the web for latest information and news",
    instructions: &[
        "Search for latest news and information about the given topic",
        "Provide 3-5 key findings with dates and sources",
        "Format information in clear, digestible bullet points",
    ],
    tools: &[ToolKind::WebSearch],
};

pub static FINANCE_AGENT: AgentProfile = AgentProfile {
    key: AgentKey::Finance,
    name: "Finance Agent",
    role: "Analyze financial data and market trends",
    instructions: &[
        "Analyze financial metrics and market data",
        "Present data in clear tables",
        "Highlight key financial insights and trends",
    ],
    tools: &[ToolKind::StockData],
};

pub static TECH_MARKET_AGENT: AgentProfile = AgentProfile {
    key: AgentKey::TechMarket,
    name: "Technology and Market Opportunity Expert",
    role: "Analyze technology trends, market dynamics, and identify value creation opportunities",
    instructions: &[
        "Provide a structured market analysis with these specific sections:",
        "1. MARKET SIZE & GROWTH",
        "- Current global market size with specific dollar amount",
        "- Year-over-year growth rate (CAGR)",
        "- 5-year market size projection",
        "- Break down by major geographic regions",
        "2. MARKET SEGMENTS",
        "- List top 3-5 market segments with size/share",
        "- Identify fastest growing segments",
        "- Key drivers for each segment",
        "3. COMPETITIVE LANDSCAPE",
        "- Market share of top 5 players",
        "- Recent funding rounds and valuations",
        "- Key partnerships and acquisitions",
        "4. GROWTH DRIVERS & TRENDS",
        "- List specific technological advancements",
        "- Regulatory impacts",
        "- Customer demand patterns",
        "Important:",
        "- Always include specific numbers and dates",
        "- Cite sources for all data",
        "- Use bullet points for clarity",
        "- If exact figures unavailable, provide range estimates with justification",
    ],
    tools: &[ToolKind::WebSearch],
};

pub static VALUE_CAPTURE_AGENT: AgentProfile = AgentProfile {
    key: AgentKey::ValueCapture,
    name: "Value Capture Strategist",
    role: "Develop strategies for IP protection, market positioning, and competitive advantage",
    instructions: &[
        "Focus on IP protection strategies",
        "Develop market positioning recommendations",
        "Identify competitive advantages",
        "Provide actionable strategic recommendations",
        "Always include sources",
    ],
    tools: &[ToolKind::WebSearch],
};

pub static ORG_DESIGN_AGENT: AgentProfile = AgentProfile {
    key: AgentKey::OrgDesign,
    name: "Organizational Design Architect",
    role: "Design optimal organizational structures and collaboration networks",
    instructions: &[
        "Design team structures and collaboration frameworks",
        "Optimize for innovation and value delivery",
        "Consider organizational culture and dynamics",
        "Provide practical implementation steps",
        "Always include sources",
    ],
    tools: &[ToolKind::WebSearch],
};

pub static TEAM_LEAD: AgentProfile = AgentProfile {
    key: AgentKey::Team,
    name: "Product Management Research Team",
    role: "Coordinate the Web Agent, Finance Agent, Technology and Market Opportunity Expert, \
           Value Capture Strategist and Organizational Design Architect",
    instructions: &[
        "Follow this exact sequence:",
        "1. Web Agent: Gather latest news and developments",
        "2. Tech Market Agent: Using news context, provide detailed market analysis",
        "3. Finance Agent: Add financial metrics of key players",
        "4. Value Capture Agent: Develop strategies based on market analysis",
        "5. Org Design Agent: Propose structure based on market size and opportunity",
        "Ensure each agent builds upon previous agents' findings",
        "All market size claims must include sources",
        "Present data in tables where appropriate",
        "Highlight key opportunities and risks",
    ],
    tools: &[ToolKind::WebSearch, ToolKind::StockData],
};

pub fn profiles() -> [&'static AgentProfile; 6] {
    [
        &WEB_AGENT,
        &TECH_MARKET_AGENT,
        &FINANCE_AGENT,
        &VALUE_CAPTURE_AGENT,
        &ORG_DESIGN_AGENT,
        &TEAM_LEAD,
    ]
}

// ===== Agent trait =====

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, prompt: &str) -> Result<String, AiError>;
}

/// An agent backed by a chat model: system prompt from the profile, one user
/// turn, then as many tool rounds as the model asks for (up to
/// `MAX_TOOL_ROUNDS`).
pub struct LlmAgent {
    profile: &'static AgentProfile,
    client: AiClient,
    tools: Arc<ToolRegistry>,
}

impl LlmAgent {
    pub fn new(profile: &'static AgentProfile, client: AiClient, tools: Arc<ToolRegistry>) -> Self {
        Self {
            profile,
            client,
            tools,
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        self.profile.name
    }

    async fn run(&self, prompt: &str) -> Result<String, AiError> {
        log::info!(
            "[REPORT] {} -> {} ({} chars)",
            self.profile.name,
            self.client.model(),
            prompt.len()
        );
        let definitions = self.tools.definitions(&self.profile.tool_names());
        let mut messages = vec![
            Message::system(self.profile.system_prompt()),
            Message::user(prompt),
        ];

        for round in 0..=MAX_TOOL_ROUNDS {
            // Last round offers no tools so the model has to answer
            let offered: &[ToolDefinition] = if round < MAX_TOOL_ROUNDS {
                &definitions[..]
            } else {
                &[]
            };
            let response = self
                .client
                .generate_with_tools(messages.clone(), offered)
                .await?;

            if !response.has_tool_calls() {
                if response.content.is_empty() {
                    return Err(AiError::new(format!("{} returned no content", self.profile.name)));
                }
                return Ok(response.content);
            }

            messages.push(Message::assistant_with_tools(
                response.content,
                response.tool_calls.clone(),
            ));
            for call in response.tool_calls {
                log::info!(
                    "[REPORT] {} Running: {}({})",
                    self.profile.name,
                    call.name,
                    call.arguments
                );
                let result = self.tools.execute(&call.name, call.arguments).await;
                if !result.success {
                    log::warn!("[REPORT] {} {} failed: {}", self.profile.name, call.name, result.content);
                }
                messages.push(Message::tool_result(call.id, result.content));
            }
        }

        Err(AiError::new(format!(
            "{} kept calling tools after {} rounds",
            self.profile.name, MAX_TOOL_ROUNDS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::MockAiClient;
    use crate::ai::{AiResponse, MessageRole, ToolCall};
    use crate::tools::testing::EchoTool;
    use serde_json::json;

    #[test]
    fn test_system_prompt_lists_role_tools_and_instructions() {
        let prompt = FINANCE_AGENT.system_prompt();
        assert!(prompt.starts_with("You are Finance Agent."));
        assert!(prompt.contains("- stock_data: current price"));
        assert!(!prompt.contains("web_search"));
        assert!(prompt.contains("Present data in clear tables\n"));
    }

    #[test]
    fn test_team_lead_names_every_member() {
        let prompt = TEAM_LEAD.system_prompt();
        for profile in profiles().iter().filter(|p| p.key != AgentKey::Team) {
            assert!(prompt.contains(profile.name), "missing {}", profile.name);
        }
    }

    #[test]
    fn test_profile_keys_are_unique() {
        let all = profiles();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn test_advertised_tools_are_registered() {
        let registry = ToolRegistry::with_builtins(reqwest::Client::new());
        for profile in profiles() {
            let names = profile.tool_names();
            assert_eq!(registry.definitions(&names).len(), names.len(), "{}", profile.name);
        }
    }

    fn agent_with(responses: Vec<Result<AiResponse, AiError>>) -> (LlmAgent, MockAiClient, Arc<EchoTool>) {
        let mock = MockAiClient::new(responses);
        let search = Arc::new(EchoTool::new("web_search", "- E-bike sales up 12% (https://news.example)"));
        let mut registry = ToolRegistry::new();
        registry.register(search.clone());
        let agent = LlmAgent::new(&WEB_AGENT, AiClient::Mock(mock.clone()), Arc::new(registry));
        (agent, mock, search)
    }

    fn search_call(id: &str, query: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "web_search".to_string(),
            arguments: json!({ "query": query }),
        }
    }

    #[tokio::test]
    async fn test_plain_answer_needs_one_request() {
        let (agent, mock, search) = agent_with(vec![Ok(AiResponse::text("## News"))]);

        assert_eq!(agent.name(), "Web Agent");
        assert_eq!(agent.run("Provide latest news").await.unwrap(), "## News");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, vec!["web_search".to_string()]);
        assert_eq!(requests[0].0[0].role, MessageRole::System);
        assert_eq!(requests[0].0[1].content, "Provide latest news");
        assert!(search.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tool_results_are_fed_back() {
        let (agent, mock, search) = agent_with(vec![
            Ok(AiResponse::with_tools("", vec![search_call("call_0", "e-bike news")])),
            Ok(AiResponse::text("- E-bike sales up 12%")),
        ]);

        let answer = agent.run("Provide latest news").await.unwrap();

        assert_eq!(answer, "- E-bike sales up 12%");
        assert_eq!(search.calls(), vec![json!({"query": "e-bike news"})]);

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        let followup = &requests[1].0;
        assert_eq!(followup.len(), 4);
        assert_eq!(followup[2].role, MessageRole::Assistant);
        assert_eq!(followup[2].tool_calls[0].id, "call_0");
        assert_eq!(followup[3].role, MessageRole::Tool);
        assert_eq!(followup[3].tool_call_id.as_deref(), Some("call_0"));
        assert!(followup[3].content.contains("E-bike sales up 12%"));
    }

    #[tokio::test]
    async fn test_unknown_tool_error_goes_back_to_model() {
        let bogus = ToolCall {
            id: "call_0".to_string(),
            name: "stock_data".to_string(),
            arguments: json!({"symbol": "TSLA"}),
        };
        let (agent, mock, _) = agent_with(vec![
            Ok(AiResponse::with_tools("", vec![bogus])),
            Ok(AiResponse::text("No quote available")),
        ]);

        assert_eq!(agent.run("prices").await.unwrap(), "No quote available");
        let requests = mock.requests();
        assert_eq!(requests[1].0[3].content, "Error: Unknown tool 'stock_data'");
    }

    #[tokio::test]
    async fn test_last_round_offers_no_tools() {
        let mut responses: Vec<_> = (0..MAX_TOOL_ROUNDS)
            .map(|i| Ok(AiResponse::with_tools("", vec![search_call(&format!("call_{}", i), "more")])))
            .collect();
        responses.push(Ok(AiResponse::text("Final answer")));
        let (agent, mock, search) = agent_with(responses);

        assert_eq!(agent.run("news").await.unwrap(), "Final answer");

        let requests = mock.requests();
        assert_eq!(requests.len(), MAX_TOOL_ROUNDS + 1);
        assert!(requests[MAX_TOOL_ROUNDS].1.is_empty());
        assert_eq!(search.calls().len(), MAX_TOOL_ROUNDS);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let (agent, _, _) = agent_with(vec![Err(AiError::with_status("rate limited", 429))]);
        let err = agent.run("news").await.unwrap_err();
        assert_eq!(err.status_code, Some(429));
    }
}
