//! Outbound email.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::error::GovernanceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the message and returns the provider's message id.
    async fn send(&self, message: &EmailMessage) -> Result<String, GovernanceError>;
}

/// Transactional email API taking `{from, to, subject, html}`.
pub struct HttpEmailSender {
    api_url: String,
    api_key: String,
    from_address: String,
    http_client: Client,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: String,
}

impl HttpEmailSender {
    pub fn new(
        api_url: &str,
        api_key: &str,
        from_address: &str,
        timeout: Duration,
    ) -> Result<Self, GovernanceError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            from_address: from_address.to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl Notifier for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<String, GovernanceError> {
        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from_address,
                "to": [message.to],
                "subject": message.subject,
                "html": message.html,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GovernanceError::ExternalServiceError(format!(
                "Email to {} failed with {}: {}",
                message.to, status, text
            )));
        }

        let sent: SendResponse = response.json().await?;
        info!("Sent \"{}\" to {}", message.subject, message.to);
        Ok(sent.id)
    }
}
