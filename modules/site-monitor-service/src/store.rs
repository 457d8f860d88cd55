//! JSON file persistence for the tracking record.

use crate::error::MonitorError;
use site_monitor_types::TrackingRecord;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct TrackingStore {
    path: PathBuf,
}

impl TrackingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole record. A missing file is an empty record; a file that
    /// does not parse is reported as corrupt rather than reset.
    pub fn load(&self) -> Result<TrackingRecord, MonitorError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(
                    "[SITE_MONITOR] No tracking file at {}, starting fresh",
                    self.path.display()
                );
                return Ok(TrackingRecord::new());
            }
            Err(e) => return Err(MonitorError::io(&self.path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| MonitorError::CorruptState {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Overwrite the persisted record.
    ///
    /// Writes a sibling temp file and renames it over the target so a crash
    /// mid-write leaves the previous record intact.
    pub fn save(&self, record: &TrackingRecord) -> Result<(), MonitorError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| MonitorError::io(parent, e))?;
            }
        }

        let json = serde_json::to_vec(record).map_err(|e| MonitorError::io(&self.path, e))?;

        let tmp_path = self.temp_path();
        std::fs::write(&tmp_path, json).map_err(|e| MonitorError::io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| MonitorError::io(&self.path, e))?;

        log::debug!(
            "[SITE_MONITOR] Saved {} fingerprints to {}",
            record.len(),
            self.path.display()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackingStore::new(dir.path().join("website_tracking.json"));
        let record = store.load().unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackingStore::new(dir.path().join("website_tracking.json"));

        let mut record = TrackingRecord::new();
        record.set("https://a.example", "aaaa");
        record.set("https://b.example", "bbbb");
        store.save(&record).unwrap();

        assert_eq!(store.load().unwrap(), record);
        assert!(!dir.path().join("website_tracking.json.tmp").exists());
    }

    #[test]
    fn test_save_writes_flat_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("website_tracking.json");
        let store = TrackingStore::new(&path);

        let mut record = TrackingRecord::new();
        record.set("https://a.example", "aaaa");
        store.save(&record).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"https://a.example": "aaaa"}));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackingStore::new(dir.path().join("state").join("tracking.json"));
        store.save(&TrackingRecord::new()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error_and_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("website_tracking.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = TrackingStore::new(&path);
        match store.load() {
            Err(MonitorError::CorruptState { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected CorruptState, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("website_tracking.json");
        std::fs::write(&path, r#"["https://a.example"]"#).unwrap();

        let store = TrackingStore::new(&path);
        assert!(matches!(store.load(), Err(MonitorError::CorruptState { .. })));
    }
}
