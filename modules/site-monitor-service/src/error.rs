use std::fmt;
use std::path::{Path, PathBuf};

/// Errors raised by the monitor, tagged by the layer that decides what to do
/// with them.
#[derive(Debug)]
pub enum MonitorError {
    /// A single URL could not be fetched. Handled per URL by the detector.
    Fetch { url: String, message: String },
    /// The tracking file exists but is not a flat JSON object of strings.
    CorruptState { path: PathBuf, message: String },
    /// The tracking file could not be read or written.
    Io { path: PathBuf, message: String },
    /// The outbound mail transport rejected the notification.
    Transport(String),
    /// Startup configuration is missing or malformed.
    Config(String),
}

impl MonitorError {
    pub fn fetch(url: &str, message: impl Into<String>) -> Self {
        MonitorError::Fetch {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn io(path: &Path, err: impl fmt::Display) -> Self {
        MonitorError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Fetch { url, message } => {
                write!(f, "Failed to fetch {}: {}", url, message)
            }
            MonitorError::CorruptState { path, message } => write!(
                f,
                "Tracking file {} is corrupt: {}",
                path.display(),
                message
            ),
            MonitorError::Io { path, message } => {
                write!(f, "Tracking file {}: {}", path.display(), message)
            }
            MonitorError::Transport(message) => {
                write!(f, "Failed to send notification: {}", message)
            }
            MonitorError::Config(message) => write!(f, "Invalid configuration: {}", message),
        }
    }
}

impl std::error::Error for MonitorError {}
