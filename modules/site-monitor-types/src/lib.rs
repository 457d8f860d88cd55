//! Shared types for the site monitor service and its RPC clients.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =====================================================
// Tracking Record
// =====================================================

/// Last-observed fingerprint per monitored URL.
///
/// Serialized as a flat JSON object (`{"<url>": "<hex digest>"}`), the same
/// layout the tracking file has always used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingRecord {
    digests: BTreeMap<String, String>,
}

impl TrackingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.digests.get(url).map(String::as_str)
    }

    /// Record the latest digest for a URL, returning the previous one.
    pub fn set(&mut self, url: impl Into<String>, digest: impl Into<String>) -> Option<String> {
        self.digests.insert(url.into(), digest.into())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.digests.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.digests.iter().map(|(u, d)| (u.as_str(), d.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TrackingRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            digests: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// =====================================================
// Domain Types
// =====================================================

/// Status of a monitored site as of its most recent check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    /// Content matched the stored fingerprint
    Unchanged,
    /// Content differed from the stored fingerprint
    Changed,
    /// First successful observation; fingerprint recorded, nothing to compare
    Baseline,
    /// Never checked, or the last fetch failed
    Uncertain,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Unchanged => "unchanged",
            SiteStatus::Changed => "changed",
            SiteStatus::Baseline => "baseline",
            SiteStatus::Uncertain => "uncertain",
        }
    }
}

/// A single detected change for a site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub detected_at: String,
    pub kind: String,
    pub previous_digest: String,
    pub digest: String,
}

/// A monitored website and what the service last saw of it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredSite {
    pub url: String,
    pub status: SiteStatus,
    pub digest: Option<String>,
    pub last_checked_at: Option<String>,
    pub last_error: Option<String>,
    pub change_history: Vec<ChangeEvent>,
}

impl MonitoredSite {
    pub fn unchecked(url: impl Into<String>, digest: Option<String>) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Uncertain,
            digest,
            last_checked_at: None,
            last_error: None,
            change_history: Vec::new(),
        }
    }
}

/// A URL that could not be fetched during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

/// Result of one full detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub started_at: String,
    pub finished_at: String,
    pub checked: usize,
    pub changed: Vec<String>,
    pub failed: Vec<FetchFailure>,
    pub notified: bool,
}

// =====================================================
// Filter / Query Types
// =====================================================

/// Filters for listing monitored sites
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteFilter {
    pub status: Option<SiteStatus>,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub monitored_sites: usize,
    pub changed_sites: usize,
    pub uncertain_sites: usize,
    pub last_tick_at: Option<String>,
    pub last_scan: Option<ScanSummary>,
    pub poll_interval_secs: u64,
    pub notifications_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_record_serializes_as_flat_object() {
        let mut record = TrackingRecord::new();
        record.set("https://a.example", "d41d8cd98f00b204e9800998ecf8427e");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"https://a.example":"d41d8cd98f00b204e9800998ecf8427e"}"#
        );
    }

    #[test]
    fn tracking_record_reads_legacy_file_contents() {
        let raw = r#"{"https://a.example": "aa", "https://b.example": "bb"}"#;
        let record: TrackingRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("https://b.example"), Some("bb"));
        assert!(record.get("https://c.example").is_none());
    }

    #[test]
    fn tracking_record_rejects_non_string_digests() {
        let raw = r#"{"https://a.example": 42}"#;
        assert!(serde_json::from_str::<TrackingRecord>(raw).is_err());
    }

    #[test]
    fn set_returns_previous_digest() {
        let mut record = TrackingRecord::new();
        assert_eq!(record.set("u", "h1"), None);
        assert_eq!(record.set("u", "h2"), Some("h1".to_string()));
        assert_eq!(record.get("u"), Some("h2"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn site_status_uses_lowercase_names() {
        let json = serde_json::to_string(&SiteStatus::Uncertain).unwrap();
        assert_eq!(json, "\"uncertain\"");
        let parsed: SiteStatus = serde_json::from_str("\"changed\"").unwrap();
        assert_eq!(parsed, SiteStatus::Changed);
        assert_eq!(SiteStatus::Baseline.as_str(), "baseline");
    }

    #[test]
    fn rpc_response_omits_empty_fields() {
        let ok = serde_json::to_value(RpcResponse::ok(3)).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 3}));
        let err = serde_json::to_value(RpcResponse::<u8>::err("boom")).unwrap();
        assert_eq!(err, serde_json::json!({"success": false, "error": "boom"}));
    }
}
