//! Gmail API mail transport.

use crate::config::MailConfig;
use crate::error::MonitorError;
use crate::notifier::{MailTransport, OutboundEmail};
use async_trait::async_trait;
use base64::Engine;
use serde_json::json;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
const TOKEN_REFRESH_URL: &str = "https://oauth2.googleapis.com/token";

/// Sends notifications through `users/me/messages/send`.
pub struct GmailTransport {
    http: reqwest::Client,
    config: MailConfig,
}

impl GmailTransport {
    pub fn new(http: reqwest::Client, config: MailConfig) -> Self {
        Self { http, config }
    }

    /// Exchange the refresh token for a fresh access token when OAuth client
    /// credentials are configured; otherwise use the configured token as-is.
    async fn access_token(&self) -> Result<String, String> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            self.config.refresh_token.as_deref(),
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        ) else {
            return Ok(self.config.access_token.clone());
        };

        let response = self
            .http
            .post(TOKEN_REFRESH_URL)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| format!("Failed to refresh token: {}", e))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(format!("Token refresh failed: {}", error));
        }

        #[derive(serde::Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse token response: {}", e))?;

        Ok(token_response.access_token)
    }

    async fn send_raw(&self, raw: String) -> Result<(), String> {
        let token = self.access_token().await?;
        let url = format!("{}/users/me/messages/send", GMAIL_API_BASE);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| format!("Failed to send message: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(format!("Gmail API error ({}): {}", status, error));
        }

        Ok(())
    }
}

/// Build an RFC 2822 plain-text message and base64url encode it the way the
/// Gmail API expects.
pub fn encode_message(config: &MailConfig, email: &OutboundEmail) -> String {
    let message = format!(
        "From: \"{}\" <{}>\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
        config.sender_name.replace('"', "'"),
        config.sender_email,
        config.receiver_email,
        email.subject,
        email.body.replace('\n', "\r\n")
    );

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(message.as_bytes())
}

#[async_trait]
impl MailTransport for GmailTransport {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MonitorError> {
        let raw = encode_message(&self.config, email);
        self.send_raw(raw).await.map_err(MonitorError::Transport)?;
        log::info!(
            "[GMAIL] Sent '{}' to {}",
            email.subject,
            self.config.receiver_email
        );
        Ok(())
    }
}
