//! Change notifications.

use crate::error::MonitorError;
use async_trait::async_trait;

pub const NOTIFICATION_SUBJECT: &str = "Website Changes Detected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub body: String,
}

/// Outbound mail transport
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, email: &OutboundEmail) -> Result<(), MonitorError>;
}

/// Build the notification for a change set. Returns `None` when nothing
/// changed.
pub fn compose_notification(changes: &[String]) -> Option<OutboundEmail> {
    if changes.is_empty() {
        return None;
    }

    Some(OutboundEmail {
        subject: NOTIFICATION_SUBJECT.to_string(),
        body: format!(
            "The following websites have changed since the last scan:\n\n{}",
            changes.join("\n")
        ),
    })
}

/// Send at most one email listing every changed URL.
///
/// Returns whether an email was sent. Transport failures are returned to the
/// caller as-is.
pub async fn notify(changes: &[String], transport: &dyn MailTransport) -> Result<bool, MonitorError> {
    let Some(email) = compose_notification(changes) else {
        log::info!("[SITE_MONITOR] No changes detected.");
        return Ok(false);
    };

    transport.send(&email).await?;
    log::info!(
        "[SITE_MONITOR] Notified via {} about {} changed site(s)",
        transport.name(),
        changes.len()
    );
    Ok(true)
}

/// Transport used when no mail credentials are configured.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MonitorError> {
        log::warn!(
            "[SITE_MONITOR] Mail not configured, notification not sent.\nSubject: {}\n{}",
            email.subject,
            email.body
        );
        Ok(())
    }
}
