//! Request and response models for the HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::notification::Recipient;

/// Response for a successful notify request. `sent` is false for
/// channels with no delivery wired (sms, in_app).
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub status: &'static str,
    pub id: Uuid,
    pub sent: bool,
}

/// Response for a successful retry.
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub status: &'static str,
    pub id: Uuid,
    pub retried: bool,
}

/// Body of `POST /preview-email`.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub event: Option<String>,
    pub user: Option<Recipient>,
    pub data: Option<Value>,
}

/// Rendered template text, nothing persisted.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub event: Option<String>,
    pub preview: String,
}
