//! Outbound delivery clients.
//!
//! Each client is a thin wrapper over a third-party transactional API:
//! one call out, success or a failure result carrying the provider's
//! error detail. Retries are the caller's responsibility.

mod sendgrid;
mod termii;

use async_trait::async_trait;
use thiserror::Error;

pub use sendgrid::SendGridClient;
pub use termii::TermiiClient;

/// Errors produced by delivery clients.
///
/// Every failure mode ends up here; clients never propagate transport
/// faults as panics or opaque errors.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Required provider configuration is absent, detected before any
    /// network call is made.
    #[error("Missing provider configuration: {0}")]
    NotConfigured(&'static str),

    /// The provider could not be reached.
    #[error("Provider request failed: {0}")]
    Transport(String),

    /// The provider answered but refused the message.
    #[error("Provider rejected the message: {0}")]
    Rejected(String),
}

/// Capability to send a single email.
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Capability to send a single SMS.
#[async_trait]
pub trait SmsClient: Send + Sync {
    async fn send_sms(&self, to: &str, message: &str) -> Result<(), DeliveryError>;
}
