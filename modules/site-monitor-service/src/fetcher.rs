//! Content fetchers for monitored pages.
//!
//! A fetcher turns a URL into a string representation of the page. The
//! detector hashes whatever comes back, so two fetchers will produce
//! different fingerprints for the same page.

use crate::config::FirecrawlConfig;
use crate::error::MonitorError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> Result<String, MonitorError>;
}

// =====================================================
// Plain HTTP
// =====================================================

/// Fetches the raw response body with a GET request.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<String, MonitorError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MonitorError::fetch(url, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::fetch(url, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| MonitorError::fetch(url, format!("failed to read body: {}", e)))
    }
}

// =====================================================
// Firecrawl
// =====================================================

#[derive(Debug, Deserialize)]
struct CrawlStarted {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CrawlStatus {
    pub status: String,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub(crate) fn parse_crawl_status(body: &str) -> Result<CrawlStatus, String> {
    serde_json::from_str(body).map_err(|e| format!("unexpected crawl status payload: {}", e))
}

/// Crawls a URL through the Firecrawl API and returns the crawl result
/// pages serialized as JSON text.
pub struct FirecrawlFetcher {
    client: reqwest::Client,
    config: FirecrawlConfig,
}

impl FirecrawlFetcher {
    pub fn new(client: reqwest::Client, config: FirecrawlConfig) -> Self {
        Self { client, config }
    }

    async fn start_crawl(&self, url: &str) -> Result<String, String> {
        let endpoint = format!("{}/v1/crawl", self.config.api_url);
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "url": url, "limit": self.config.crawl_limit }))
            .send()
            .await
            .map_err(|e| format!("Firecrawl request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        if !status.is_success() {
            return Err(format!("Firecrawl API error ({}): {}", status, body));
        }

        let started: CrawlStarted = serde_json::from_str(&body)
            .map_err(|e| format!("unexpected crawl response: {}", e))?;
        match (started.success, started.id) {
            (true, Some(id)) => Ok(id),
            _ => Err(started
                .error
                .unwrap_or_else(|| "crawl job was not accepted".to_string())),
        }
    }

    async fn crawl(&self, url: &str) -> Result<String, String> {
        let job_id = self.start_crawl(url).await?;
        let status_url = format!("{}/v1/crawl/{}", self.config.api_url, job_id);
        log::debug!("[SITE_MONITOR] Firecrawl job {} started for {}", job_id, url);

        collect_crawl(
            self,
            &job_id,
            &status_url,
            self.config.max_polls,
            Duration::from_secs(self.config.poll_interval_secs),
        )
        .await
    }
}

#[async_trait]
pub(crate) trait CrawlStatusSource: Send + Sync {
    async fn get_status(&self, status_url: &str) -> Result<CrawlStatus, String>;
}

#[async_trait]
impl CrawlStatusSource for FirecrawlFetcher {
    async fn get_status(&self, status_url: &str) -> Result<CrawlStatus, String> {
        let response = self
            .client
            .get(status_url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| format!("Firecrawl status request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        if !status.is_success() {
            return Err(format!("Firecrawl API error ({}): {}", status, body));
        }

        parse_crawl_status(&body)
    }
}

/// Polls a crawl job until it completes, then follows its `next` pages.
/// Status polls and page fetches share the `max_polls` budget.
pub(crate) async fn collect_crawl(
    source: &dyn CrawlStatusSource,
    job_id: &str,
    status_url: &str,
    max_polls: u32,
    poll_interval: Duration,
) -> Result<String, String> {
    let mut polls = 0;
    let mut completed = None;

    while polls < max_polls {
        polls += 1;
        let page = source.get_status(status_url).await?;
        match page.status.as_str() {
            "completed" => {
                completed = Some(page);
                break;
            }
            "failed" | "cancelled" => {
                return Err(format!(
                    "crawl job {} {}: {}",
                    job_id,
                    page.status,
                    page.error.unwrap_or_default()
                ));
            }
            _ => tokio::time::sleep(poll_interval).await,
        }
    }

    let Some(page) = completed else {
        return Err(format!(
            "crawl job {} not finished after {} polls",
            job_id, max_polls
        ));
    };
    let mut data = page.data;
    let mut next = page.next;

    while let Some(next_url) = next {
        if polls >= max_polls {
            return Err(format!(
                "crawl job {} still paging after {} requests",
                job_id, max_polls
            ));
        }
        polls += 1;
        let mut more = source.get_status(&next_url).await?;
        data.append(&mut more.data);
        next = more.next.take();
    }

    serde_json::to_string(&data).map_err(|e| format!("failed to serialize crawl data: {}", e))
}

#[async_trait]
impl ContentFetcher for FirecrawlFetcher {
    fn name(&self) -> &str {
        "firecrawl"
    }

    async fn fetch(&self, url: &str) -> Result<String, MonitorError> {
        self.crawl(url).await.map_err(|e| MonitorError::fetch(url, e))
    }
}
