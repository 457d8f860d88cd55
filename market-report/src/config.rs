use crate::error::ReportError;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_DASHBOARD_PORT: u16 = 9104;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAI,
    Ollama,
}

impl FromStr for AiProvider {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAI),
            "ollama" => Ok(AiProvider::Ollama),
            _ => Err(ReportError::Config(format!("Unknown REPORT_AI_PROVIDER: {}", s))),
        }
    }
}

/// How the report is produced: five sequential stages, or one team-lead prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Pipeline,
    Team,
}

impl FromStr for AnalysisMode {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pipeline" => Ok(AnalysisMode::Pipeline),
            "team" => Ok(AnalysisMode::Team),
            _ => Err(ReportError::Config(format!("Unknown REPORT_MODE: {}", s))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub provider: AiProvider,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub mode: AnalysisMode,
    pub output_dir: PathBuf,
    pub dashboard_port: u16,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get("REPORT_AI_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => AiProvider::OpenAI,
        };

        let api_key = get("OPENAI_API_KEY");
        if provider == AiProvider::OpenAI && api_key.is_none() {
            return Err(ReportError::Config(
                "OPENAI_API_KEY is required when REPORT_AI_PROVIDER=openai".to_string(),
            ));
        }

        let mode = match get("REPORT_MODE") {
            Some(raw) => raw.parse()?,
            None => AnalysisMode::Pipeline,
        };

        let max_tokens = match get("REPORT_MAX_TOKENS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ReportError::Config(format!("REPORT_MAX_TOKENS must be a number, got {}", raw))
            })?,
            None => DEFAULT_MAX_TOKENS,
        };

        let dashboard_port = match get("REPORT_DASHBOARD_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ReportError::Config(format!("REPORT_DASHBOARD_PORT must be a port, got {}", raw))
            })?,
            None => DEFAULT_DASHBOARD_PORT,
        };

        Ok(Self {
            provider,
            api_key,
            endpoint: get("REPORT_AI_ENDPOINT"),
            model: get("REPORT_AI_MODEL"),
            max_tokens,
            mode,
            output_dir: get("REPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("reports")),
            dashboard_port,
        })
    }
}
