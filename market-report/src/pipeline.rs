//! The fixed five-stage analysis, or the single team-lead prompt.
//!
//! Stages run strictly one after another and the first failing agent ends
//! the run. Each prompt is built from the topic alone.

use crate::agents::{self, Agent, AgentKey, LlmAgent};
use crate::ai::AiClient;
use crate::error::ReportError;
use crate::tools::ToolRegistry;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Stage {
    pub section: &'static str,
    pub agent: AgentKey,
    pub status: &'static str,
    template: &'static str,
}

impl Stage {
    pub fn prompt(&self, topic: &str) -> String {
        self.template.replace("{topic}", topic)
    }
}

pub static STAGES: [Stage; 5] = [
    Stage {
        section: "Industry News",
        agent: AgentKey::Web,
        status: "Gathering latest news...",
        template: "Provide latest news and developments in the {topic} industry",
    },
    Stage {
        section: "Market Analysis",
        agent: AgentKey::TechMarket,
        status: "Analyzing market...",
        template: "Based on the above news, provide detailed market analysis for {topic} industry",
    },
    Stage {
        section: "Financial Analysis",
        agent: AgentKey::Finance,
        status: "Analyzing financials...",
        template: "Analyze financial metrics of key players in the {topic} industry",
    },
    Stage {
        section: "Strategic Recommendations",
        agent: AgentKey::ValueCapture,
        status: "Developing strategies...",
        template: "Develop strategic recommendations for entering the {topic} market",
    },
    Stage {
        section: "Organizational Design",
        agent: AgentKey::OrgDesign,
        status: "Designing organization...",
        template: "Propose organizational structure for a {topic} company",
    },
];

pub const TEAM_SECTION: &str = "Comprehensive";

const TEAM_TEMPLATE: &str = "Analyze the opportunities, challenges, and strategies for creating \
a company focused on '{topic}'. Provide comprehensive recommendations on market positioning, \
financial planning, technology trends, organizational design, and value capture.";

pub fn team_prompt(topic: &str) -> String {
    TEAM_TEMPLATE.replace("{topic}", topic)
}

/// One agent's raw reply, labelled with the section it fills.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub section: String,
    pub agent: String,
    pub content: String,
}

pub struct ReportPipeline {
    agents: HashMap<AgentKey, Arc<dyn Agent>>,
}

impl ReportPipeline {
    pub fn new(agents: HashMap<AgentKey, Arc<dyn Agent>>) -> Self {
        Self { agents }
    }

    /// One `LlmAgent` per built-in profile, all sharing the same client and tools.
    pub fn from_client(client: &AiClient, tools: Arc<ToolRegistry>) -> Self {
        let agents = agents::profiles()
            .into_iter()
            .map(|profile| {
                let agent: Arc<dyn Agent> =
                    Arc::new(LlmAgent::new(profile, client.clone(), tools.clone()));
                (profile.key, agent)
            })
            .collect();
        Self::new(agents)
    }

    fn agent(&self, key: AgentKey) -> Result<&Arc<dyn Agent>, ReportError> {
        self.agents
            .get(&key)
            .ok_or_else(|| ReportError::Config(format!("No agent registered for {:?}", key)))
    }

    /// Run all five stages. `on_progress` gets `(completed, total, status)`
    /// before each stage and once more when the last one finishes.
    pub async fn run<F>(&self, topic: &str, mut on_progress: F) -> Result<Vec<ReportSection>, ReportError>
    where
        F: FnMut(usize, usize, &str),
    {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ReportError::EmptyTopic);
        }

        let total = STAGES.len();
        let mut sections = Vec::with_capacity(total);

        for (i, stage) in STAGES.iter().enumerate() {
            let agent = self.agent(stage.agent)?;
            on_progress(i, total, stage.status);

            let content = agent
                .run(&stage.prompt(topic))
                .await
                .map_err(|e| {
                    log::error!("[REPORT] {} failed at '{}': {}", agent.name(), stage.section, e);
                    ReportError::agent(agent.name(), e)
                })?;

            log::info!(
                "[REPORT] {} done ({}/{}, {} chars)",
                stage.section,
                i + 1,
                total,
                content.len()
            );
            sections.push(ReportSection {
                section: stage.section.to_string(),
                agent: agent.name().to_string(),
                content,
            });
        }

        on_progress(total, total, "Analysis complete!");
        Ok(sections)
    }

    /// Send the comprehensive prompt to the team lead as a single section.
    pub async fn run_team(&self, topic: &str) -> Result<Vec<ReportSection>, ReportError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ReportError::EmptyTopic);
        }

        let lead = self.agent(AgentKey::Team)?;
        let content = lead
            .run(&team_prompt(topic))
            .await
            .map_err(|e| ReportError::agent(lead.name(), e))?;

        Ok(vec![ReportSection {
            section: TEAM_SECTION.to_string(),
            agent: lead.name().to_string(),
            content,
        }])
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::ai::AiError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every prompt with a canned reply and records what it was asked.
    pub struct ScriptedAgent {
        name: String,
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedAgent {
        pub fn replying(name: &str, reply: &str) -> Self {
            Self {
                name: name.to_string(),
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(name: &str, message: &str) -> Self {
            Self {
                name: name.to_string(),
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(AiError::new)
        }
    }

    pub fn scripted_pipeline(agents: &[(AgentKey, Arc<ScriptedAgent>)]) -> ReportPipeline {
        let map = agents
            .iter()
            .map(|(key, agent)| {
                let agent: Arc<dyn Agent> = agent.clone();
                (*key, agent)
            })
            .collect();
        ReportPipeline::new(map)
    }

    pub fn all_replying() -> Vec<(AgentKey, Arc<ScriptedAgent>)> {
        agents::profiles()
            .iter()
            .map(|p| {
                let reply = format!("{} reply", p.name);
                (p.key, Arc::new(ScriptedAgent::replying(p.name, &reply)))
            })
            .collect()
    }
}
