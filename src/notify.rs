//! Chat webhook notifier.
//!
//! Posts a message as a Slack-style incoming webhook payload: the JSON
//! document travels in a single `payload` form field.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Timeout for the webhook POST.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("no webhook URL configured")]
    NoWebhook,
    #[error("webhook request failed: {0}")]
    Network(String),
    #[error("webhook answered HTTP {0}")]
    HttpStatus(u16),
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    text: &'a str,
    channel: &'a str,
    username: &'a str,
}

/// Sends preformatted text to the configured webhook.
#[derive(Debug, Clone)]
pub struct Notifier {
    username: String,
    http: reqwest::Client,
}

impl Notifier {
    /// `username` is the display name shown in the channel.
    pub fn new(username: &str) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        Ok(Self {
            username: username.to_string(),
            http,
        })
    }

    /// Fire-and-forget delivery. Failures are logged and dropped.
    pub async fn send_message(&self, webhook_url: &str, channel: &str, text: &str) {
        match self.try_send(webhook_url, channel, text).await {
            Ok(()) => tracing::info!("Notifier: delivered report to {}", channel),
            Err(e) => tracing::warn!("Notifier: {}", e),
        }
    }

    async fn try_send(&self, webhook_url: &str, channel: &str, text: &str) -> Result<(), NotifyError> {
        if webhook_url.is_empty() {
            return Err(NotifyError::NoWebhook);
        }

        let payload = serde_json::to_string(&Payload {
            text,
            channel,
            username: &self.username,
        })
        .map_err(|e| NotifyError::Network(e.to_string()))?;

        let response = self
            .http
            .post(webhook_url)
            .form(&[("payload", payload)])
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::HttpStatus(status.as_u16()));
        }

        Ok(())
    }
}
