//! Change detection over the tracked URL list.
//!
//! Each URL is fetched in list order and its fingerprint compared to the
//! stored one. A URL seen for the first time is only recorded. A URL whose
//! fetch fails keeps its stored fingerprint and is retried on the next run.

use crate::fetcher::ContentFetcher;
use crate::fingerprint::fingerprint;
use site_monitor_types::{FetchFailure, TrackingRecord};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// First successful fetch; nothing to compare against
    Baseline { digest: String },
    Unchanged { digest: String },
    Changed { previous: String, digest: String },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct UrlCheck {
    pub url: String,
    pub observation: Observation,
    pub checked_at: String,
}

#[derive(Debug, Default)]
pub struct DetectionOutcome {
    pub checks: Vec<UrlCheck>,
    /// Changed URLs in input order
    pub changed: Vec<String>,
    pub failed: Vec<FetchFailure>,
}

/// Run one detection pass, updating `record` in place.
///
/// The caller owns persistence: load before, save after.
pub async fn detect_changes(
    urls: &[String],
    fetcher: &dyn ContentFetcher,
    record: &mut TrackingRecord,
) -> DetectionOutcome {
    let mut outcome = DetectionOutcome::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for url in urls {
        if !seen.insert(url.as_str()) {
            continue;
        }

        let content = fetcher.fetch(url).await;
        let checked_at = chrono::Utc::now().to_rfc3339();

        let observation = match content {
            Ok(content) => {
                let digest = fingerprint(&content);
                match record.set(url.as_str(), digest.clone()) {
                    None => {
                        log::info!("[SITE_MONITOR] Baseline recorded for {}", url);
                        Observation::Baseline { digest }
                    }
                    Some(previous) if previous != digest => {
                        log::info!("[SITE_MONITOR] Change detected on {}", url);
                        outcome.changed.push(url.clone());
                        Observation::Changed { previous, digest }
                    }
                    Some(_) => Observation::Unchanged { digest },
                }
            }
            Err(e) => {
                log::warn!("[SITE_MONITOR] Error monitoring {}: {}", url, e);
                outcome.failed.push(FetchFailure {
                    url: url.clone(),
                    error: e.to_string(),
                });
                Observation::Failed {
                    error: e.to_string(),
                }
            }
        };

        outcome.checks.push(UrlCheck {
            url: url.clone(),
            observation,
            checked_at,
        });
    }

    outcome
}
