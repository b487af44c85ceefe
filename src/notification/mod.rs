//! Notification domain: record types and the lifecycle controller.

mod relay;
mod types;

pub use relay::{NotificationRelay, NotifyOutcome};
pub use types::{
    retry_delay, Channel, FailureInfo, NewNotification, Notification, NotifyRequest, Recipient,
    Status,
};
