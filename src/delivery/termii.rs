//! Termii SMS client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::TermiiConfig;

use super::{DeliveryError, SmsClient};

const TERMII_API_BASE: &str = "https://api.ng.termii.com";
const DEFAULT_SENDER_ID: &str = "HostelApp";

/// SMS client backed by the Termii send API.
pub struct TermiiClient {
    http: Client,
    config: TermiiConfig,
    base_url: String,
}

impl TermiiClient {
    pub fn new(config: TermiiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
            base_url: TERMII_API_BASE.to_string(),
        }
    }

    /// Override the API base URL. Used by tests to point at a stub server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SmsClient for TermiiClient {
    async fn send_sms(&self, to: &str, message: &str) -> Result<(), DeliveryError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(DeliveryError::NotConfigured("TERMII_API_KEY"))?;
        let sender_id = self.config.sender_id.as_deref().unwrap_or(DEFAULT_SENDER_ID);

        let payload = json!({
            "to": to,
            "from": sender_id,
            "sms": message,
            "type": "plain",
            "channel": "dnd",
            "api_key": api_key,
        });

        let response = self
            .http
            .post(format!("{}/api/sms/send", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        // Termii signals acceptance with a message_id in the response body
        if body.get("message_id").is_some() {
            tracing::debug!(to = %to, "SMS accepted by Termii");
            Ok(())
        } else {
            Err(DeliveryError::Rejected(body.to_string()))
        }
    }
}
