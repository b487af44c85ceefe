//! SendGrid transactional email client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::SendGridConfig;

use super::{DeliveryError, EmailClient};

const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";

/// Email client backed by the SendGrid v3 mail send API.
///
/// Credentials are injected at construction; a client built from an
/// unconfigured [`SendGridConfig`] reports `NotConfigured` on every send
/// instead of failing at startup.
pub struct SendGridClient {
    http: Client,
    config: SendGridConfig,
    base_url: String,
}

impl SendGridClient {
    pub fn new(config: SendGridConfig) -> Self {
        if config.api_key.is_none() {
            tracing::warn!("SENDGRID_API_KEY is missing, email delivery will fail");
        }
        Self {
            http: Client::new(),
            config,
            base_url: SENDGRID_API_BASE.to_string(),
        }
    }

    /// Override the API base URL. Used by tests to point at a stub server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl EmailClient for SendGridClient {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(DeliveryError::NotConfigured("SENDGRID_API_KEY"))?;
        let from = self
            .config
            .from
            .as_ref()
            .ok_or(DeliveryError::NotConfigured("SENDGRID_FROM"))?;

        let payload = json!({
            "personalizations": [{
                "to": [{"email": to}],
                "subject": subject
            }],
            "from": {"email": from},
            "content": [{
                "type": "text/plain",
                "value": body
            }]
        });

        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        if response.status().is_success() {
            tracing::debug!(to = %to, "Email accepted by SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            Err(DeliveryError::Rejected(format!("{status}: {detail}")))
        }
    }
}
