//! One full monitoring run: load, detect, save, notify.

use crate::detector::{self, UrlCheck};
use crate::error::MonitorError;
use crate::fetcher::ContentFetcher;
use crate::notifier::{self, MailTransport};
use crate::store::TrackingStore;
use site_monitor_types::{ScanSummary, TrackingRecord};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct ScanOutcome {
    pub summary: ScanSummary,
    pub checks: Vec<UrlCheck>,
}

pub struct Monitor {
    urls: Vec<String>,
    fetcher: Arc<dyn ContentFetcher>,
    transport: Arc<dyn MailTransport>,
    store: TrackingStore,
    /// Held for the whole run so the tracking file has a single reader/writer
    scan_lock: Mutex<()>,
}

impl Monitor {
    pub fn new(
        urls: Vec<String>,
        fetcher: Arc<dyn ContentFetcher>,
        transport: Arc<dyn MailTransport>,
        store: TrackingStore,
    ) -> Self {
        Self {
            urls,
            fetcher,
            transport,
            store,
            scan_lock: Mutex::new(()),
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Current persisted record, for seeding the dashboard.
    pub fn load_record(&self) -> Result<TrackingRecord, MonitorError> {
        self.store.load()
    }

    pub async fn run_once(&self) -> Result<ScanOutcome, MonitorError> {
        let _guard = self.scan_lock.lock().await;
        let started_at = chrono::Utc::now().to_rfc3339();

        let mut record = self.store.load()?;

        log::info!(
            "[SITE_MONITOR] Checking {} site(s) via {} (state: {})",
            self.urls.len(),
            self.fetcher.name(),
            self.store.path().display()
        );
        let outcome = detector::detect_changes(&self.urls, self.fetcher.as_ref(), &mut record).await;

        self.store.save(&record)?;

        let notified = notifier::notify(&outcome.changed, self.transport.as_ref()).await?;

        let summary = ScanSummary {
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            checked: outcome.checks.len(),
            changed: outcome.changed,
            failed: outcome.failed,
            notified,
        };

        log::info!(
            "[SITE_MONITOR] Scan complete: {} checked, {} changed, {} failed",
            summary.checked,
            summary.changed.len(),
            summary.failed.len()
        );

        Ok(ScanOutcome {
            summary,
            checks: outcome.checks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::testing::{RecordingTransport, ScriptedFetcher};

    struct Harness {
        _dir: tempfile::TempDir,
        path: std::path::PathBuf,
        fetcher: Arc<ScriptedFetcher>,
        transport: Arc<RecordingTransport>,
        monitor: Monitor,
    }

    fn harness(urls: &[&str], fetcher: ScriptedFetcher, transport: RecordingTransport) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("website_tracking.json");
        let fetcher = Arc::new(fetcher);
        let transport = Arc::new(transport);
        let monitor = Monitor::new(
            urls.iter().map(|s| s.to_string()).collect(),
            fetcher.clone(),
            transport.clone(),
            TrackingStore::new(&path),
        );
        Harness {
            _dir: dir,
            path,
            fetcher,
            transport,
            monitor,
        }
    }

    #[tokio::test]
    async fn test_first_run_baselines_without_email() {
        let h = harness(
            &["A", "B"],
            ScriptedFetcher::new().page("A", "a1").page("B", "b1"),
            RecordingTransport::new(),
        );

        let outcome = h.monitor.run_once().await.unwrap();

        assert_eq!(outcome.summary.checked, 2);
        assert!(outcome.summary.changed.is_empty());
        assert!(!outcome.summary.notified);
        assert!(h.transport.sent().is_empty());

        let saved = TrackingStore::new(&h.path).load().unwrap();
        assert_eq!(saved.get("A"), Some(fingerprint("a1").as_str()));
        assert_eq!(saved.get("B"), Some(fingerprint("b1").as_str()));
    }

    #[tokio::test]
    async fn test_second_run_reports_changes_once() {
        let h = harness(
            &["A", "B", "C"],
            ScriptedFetcher::new().page("A", "a1").page("B", "b1").page("C", "c1"),
            RecordingTransport::new(),
        );
        h.monitor.run_once().await.unwrap();

        h.fetcher.set_page("A", "a2");
        h.fetcher.set_page("C", "c2");
        let outcome = h.monitor.run_once().await.unwrap();

        assert_eq!(outcome.summary.changed, vec!["A", "C"]);
        assert!(outcome.summary.notified);
        let emails = h.transport.sent();
        assert_eq!(emails.len(), 1);
        assert!(emails[0].body.contains("A\nC"));
        assert!(!emails[0].body.contains('B'));
    }

    #[tokio::test]
    async fn test_corrupt_state_aborts_before_fetching() {
        let h = harness(
            &["A"],
            ScriptedFetcher::new().page("A", "a1"),
            RecordingTransport::new(),
        );
        std::fs::write(&h.path, "not json").unwrap();

        let err = h.monitor.run_once().await.unwrap_err();

        assert!(matches!(err, MonitorError::CorruptState { .. }));
        assert!(h.fetcher.calls().is_empty());
        assert_eq!(std::fs::read_to_string(&h.path).unwrap(), "not json");
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_after_save() {
        let h = harness(
            &["A"],
            ScriptedFetcher::new().page("A", "a2"),
            RecordingTransport::failing("quota exceeded"),
        );
        let seeded: TrackingRecord = [("A", fingerprint("a1"))].into_iter().collect();
        TrackingStore::new(&h.path).save(&seeded).unwrap();

        let err = h.monitor.run_once().await.unwrap_err();

        assert!(matches!(err, MonitorError::Transport(_)));
        let saved = TrackingStore::new(&h.path).load().unwrap();
        assert_eq!(saved.get("A"), Some(fingerprint("a2").as_str()));
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_abort_run() {
        let h = harness(
            &["A", "B", "C"],
            ScriptedFetcher::new()
                .page("A", "a2")
                .failure("B", "dns error")
                .page("C", "c1"),
            RecordingTransport::new(),
        );
        let seeded: TrackingRecord = [
            ("A", fingerprint("a1")),
            ("B", fingerprint("b1")),
            ("C", fingerprint("c1")),
        ]
        .into_iter()
        .collect();
        TrackingStore::new(&h.path).save(&seeded).unwrap();

        let outcome = h.monitor.run_once().await.unwrap();

        assert_eq!(outcome.summary.changed, vec!["A"]);
        assert_eq!(outcome.summary.failed.len(), 1);
        let saved = TrackingStore::new(&h.path).load().unwrap();
        assert_eq!(saved.get("B"), Some(fingerprint("b1").as_str()));
    }
}
