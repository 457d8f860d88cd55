//! Scripted collaborators shared by the unit tests.

use crate::error::MonitorError;
use crate::fetcher::ContentFetcher;
use crate::notifier::{MailTransport, OutboundEmail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Fetcher that serves fixed content or a fixed error per URL and records
/// the order of calls. Unknown URLs fail.
pub struct ScriptedFetcher {
    pages: Mutex<HashMap<String, Result<String, String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn page(self, url: &str, content: &str) -> Self {
        self.set_page(url, content);
        self
    }

    pub fn failure(self, url: &str, error: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error.to_string()));
        self
    }

    /// Replace the content served for a URL between runs.
    pub fn set_page(&self, url: &str, content: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(content.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, url: &str) -> Result<String, MonitorError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.lock().unwrap().get(url) {
            Some(Ok(content)) => Ok(content.clone()),
            Some(Err(e)) => Err(MonitorError::fetch(url, e.clone())),
            None => Err(MonitorError::fetch(url, "no scripted page")),
        }
    }
}

/// Transport that keeps every email it is asked to send.
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundEmail>>,
    fail_with: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MonitorError> {
        if let Some(msg) = &self.fail_with {
            return Err(MonitorError::Transport(msg.clone()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
