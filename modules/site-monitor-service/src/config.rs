//! Startup configuration, read once from the environment and passed down.

use crate::error::MonitorError;
use std::path::PathBuf;

const DEFAULT_SITES: &[&str] = &[
    "https://www.children.alabama.gov/first-class-prek/aseld/",
    "https://www.cde.ca.gov/sp/cd/re/psframework.asp",
    "https://www.fibonacciskills.com",
];

#[derive(Debug, Clone)]
pub struct FirecrawlConfig {
    pub api_key: String,
    pub api_url: String,
    pub crawl_limit: u32,
    pub poll_interval_secs: u64,
    pub max_polls: u32,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender_email: String,
    pub sender_name: String,
    pub receiver_email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub urls: Vec<String>,
    pub tracking_file: PathBuf,
    pub port: u16,
    pub poll_interval_secs: u64,
    pub firecrawl: Option<FirecrawlConfig>,
    pub mail: Option<MailConfig>,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, MonitorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, MonitorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let urls = match var("SITE_MONITOR_URLS") {
            Some(raw) => parse_url_list(&raw),
            None => DEFAULT_SITES.iter().map(|s| s.to_string()).collect(),
        };
        if urls.is_empty() {
            return Err(MonitorError::Config(
                "SITE_MONITOR_URLS does not contain any URLs".to_string(),
            ));
        }

        let firecrawl = match var("FIRECRAWL_API_KEY") {
            Some(api_key) => Some(FirecrawlConfig {
                api_key,
                api_url: var("FIRECRAWL_API_URL")
                    .unwrap_or_else(|| "https://api.firecrawl.dev".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                crawl_limit: parse_number(&var, "FIRECRAWL_CRAWL_LIMIT", 10)?,
                poll_interval_secs: parse_number(&var, "FIRECRAWL_POLL_SECS", 30)?,
                max_polls: parse_number(&var, "FIRECRAWL_MAX_POLLS", 20)?,
            }),
            None => None,
        };

        let mail = match (
            var("MONITOR_SENDER_EMAIL"),
            var("MONITOR_RECEIVER_EMAIL"),
            var("GMAIL_ACCESS_TOKEN"),
        ) {
            (Some(sender_email), Some(receiver_email), Some(access_token)) => Some(MailConfig {
                sender_name: var("MONITOR_SENDER_NAME").unwrap_or_else(|| "Site Monitor".to_string()),
                sender_email,
                receiver_email,
                access_token,
                refresh_token: var("GMAIL_REFRESH_TOKEN"),
                client_id: var("GMAIL_CLIENT_ID"),
                client_secret: var("GMAIL_CLIENT_SECRET"),
            }),
            (None, None, None) => None,
            _ => {
                return Err(MonitorError::Config(
                    "MONITOR_SENDER_EMAIL, MONITOR_RECEIVER_EMAIL and GMAIL_ACCESS_TOKEN must be set together"
                        .to_string(),
                ));
            }
        };

        Ok(Self {
            urls,
            tracking_file: var("SITE_MONITOR_TRACKING_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("website_tracking.json")),
            port: parse_number(&var, "SITE_MONITOR_PORT", 9103)?,
            poll_interval_secs: parse_number(&var, "SITE_MONITOR_POLL_INTERVAL", 3600)?,
            firecrawl,
            mail,
        })
    }
}

/// Split a comma or newline separated list, dropping blanks and repeats.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for url in raw.split([',', '\n']).map(str::trim).filter(|s| !s.is_empty()) {
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

fn parse_number<T, F>(var: &F, key: &str, default: T) -> Result<T, MonitorError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| MonitorError::Config(format!("{} must be a valid number, got '{}'", key, raw))),
        None => Ok(default),
    }
}
