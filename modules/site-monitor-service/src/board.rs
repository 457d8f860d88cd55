//! In-memory view of every monitored site for the dashboard and RPC API.
//!
//! Nothing here is persisted; the tracking file stays a flat URL→digest map.

use crate::detector::{Observation, UrlCheck};
use site_monitor_types::{ChangeEvent, MonitoredSite, SiteStatus, TrackingRecord};

/// Change events kept per site
const MAX_HISTORY: usize = 50;

pub struct SiteBoard {
    sites: Vec<MonitoredSite>,
}

impl SiteBoard {
    /// One entry per tracked URL, in configuration order, carrying the
    /// persisted digest if there is one.
    pub fn seed(urls: &[String], record: &TrackingRecord) -> Self {
        let sites = urls
            .iter()
            .map(|url| MonitoredSite::unchecked(url.as_str(), record.get(url).map(str::to_string)))
            .collect();
        Self { sites }
    }

    pub fn apply(&mut self, checks: &[UrlCheck]) {
        for check in checks {
            let Some(site) = self.sites.iter_mut().find(|s| s.url == check.url) else {
                continue;
            };
            site.last_checked_at = Some(check.checked_at.clone());

            match &check.observation {
                Observation::Baseline { digest } => {
                    site.status = SiteStatus::Baseline;
                    site.digest = Some(digest.clone());
                    site.last_error = None;
                }
                Observation::Unchanged { digest } => {
                    site.status = SiteStatus::Unchanged;
                    site.digest = Some(digest.clone());
                    site.last_error = None;
                }
                Observation::Changed { previous, digest } => {
                    site.status = SiteStatus::Changed;
                    site.digest = Some(digest.clone());
                    site.last_error = None;
                    site.change_history.insert(
                        0,
                        ChangeEvent {
                            detected_at: check.checked_at.clone(),
                            kind: "Content Update".to_string(),
                            previous_digest: previous.clone(),
                            digest: digest.clone(),
                        },
                    );
                    site.change_history.truncate(MAX_HISTORY);
                }
                Observation::Failed { error } => {
                    site.status = SiteStatus::Uncertain;
                    site.last_error = Some(error.clone());
                }
            }
        }
    }

    pub fn list(&self, status: Option<SiteStatus>) -> Vec<MonitoredSite> {
        self.sites
            .iter()
            .filter(|s| status.is_none_or(|wanted| s.status == wanted))
            .cloned()
            .collect()
    }

    pub fn count(&self, status: SiteStatus) -> usize {
        self.sites.iter().filter(|s| s.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }
}
