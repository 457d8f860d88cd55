use crate::ai::AiError;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ReportError {
    /// Startup configuration is missing or malformed.
    Config(String),
    /// The topic was blank after trimming.
    EmptyTopic,
    /// An agent call failed; the run stops at the first one.
    Agent { agent: String, source: AiError },
    /// The report file or its directory could not be written.
    Io { path: PathBuf, message: String },
    /// The `.docx` package could not be assembled.
    Document(String),
}

impl ReportError {
    pub fn agent(agent: &str, source: AiError) -> Self {
        ReportError::Agent {
            agent: agent.to_string(),
            source,
        }
    }

    pub fn io(path: &Path, err: impl fmt::Display) -> Self {
        ReportError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Config(message) => write!(f, "Invalid configuration: {}", message),
            ReportError::EmptyTopic => write!(f, "Please enter a business type"),
            ReportError::Agent { agent, source } => write!(f, "{} failed: {}", agent, source),
            ReportError::Io { path, message } => {
                write!(f, "Could not write {}: {}", path.display(), message)
            }
            ReportError::Document(message) => write!(f, "Could not build document: {}", message),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Agent { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for ReportError {
    fn from(err: zip::result::ZipError) -> Self {
        ReportError::Document(err.to_string())
    }
}
