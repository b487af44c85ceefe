use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Suggested wait before retrying a failed delivery. Advisory only: the
/// retry endpoint never enforces it.
pub fn retry_delay() -> Duration {
    Duration::minutes(5)
}

/// Delivery medium for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    #[default]
    InApp,
}

impl Channel {
    /// Parse a caller-supplied channel string, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            "in_app" => Some(Self::InApp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::InApp => "in_app",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification delivery state.
///
/// Transitions: `pending -> sent`, `pending -> failed`, and
/// `failed -> sent` via retry. A `sent` record never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure details, present only while `status = failed`.
///
/// Modeled as one sub-structure so the three fields are set and cleared
/// together; serialized flattened to keep the wire format flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInfo {
    pub error_message: String,
    pub failed_at: DateTime<Utc>,
    pub next_retry_at: DateTime<Utc>,
}

/// The persistent notification record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Store-assigned identifier
    pub id: Uuid,
    /// Tag selecting the message template
    pub event: String,
    pub user_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Caller-supplied body; the delivered email body is rendered from
    /// the template instead, but retries resend this stored text
    pub message: String,
    /// Free-form auxiliary data for template interpolation
    pub meta: Value,
    pub channel: Channel,
    pub status: Status,
    /// Count of delivery attempts, success or failure
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub failure: Option<FailureInfo>,
}

/// Fields for a record about to be created. The store assigns the id and
/// `created_at`; new records always start `pending` with zero attempts.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub event: String,
    pub user_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub meta: Value,
    pub channel: Channel,
}

/// Recipient block of a notify request.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Recipient {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    /// Salutation name: `name`, then `fullName`, then a generic fallback.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.full_name.as_deref())
            .unwrap_or("User")
    }
}

/// Body of `POST /notify`. All fields optional at the wire level; the
/// relay validates before creating anything.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifyRequest {
    pub event: Option<String>,
    pub channel: Option<String>,
    pub user: Option<Recipient>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_parse_is_case_insensitive() {
        assert_eq!(Channel::parse("EMAIL"), Some(Channel::Email));
        assert_eq!(Channel::parse("Email"), Some(Channel::Email));
        assert_eq!(Channel::parse("sms"), Some(Channel::Sms));
        assert_eq!(Channel::parse("IN_APP"), Some(Channel::InApp));
        assert_eq!(Channel::parse("push"), None);
    }

    #[test]
    fn test_channel_default_is_in_app() {
        assert_eq!(Channel::default(), Channel::InApp);
        assert_eq!(Channel::default().as_str(), "in_app");
    }

    #[test]
    fn test_recipient_display_name_fallbacks() {
        let named = Recipient {
            name: Some("Ana".into()),
            full_name: Some("Ana Mensah".into()),
            ..Default::default()
        };
        assert_eq!(named.display_name(), "Ana");

        let full_only = Recipient {
            full_name: Some("Ana Mensah".into()),
            ..Default::default()
        };
        assert_eq!(full_only.display_name(), "Ana Mensah");

        assert_eq!(Recipient::default().display_name(), "User");
    }

    #[test]
    fn test_record_serializes_camel_case_with_flattened_failure() {
        let now = Utc::now();
        let record = Notification {
            id: Uuid::new_v4(),
            event: "PAYMENT_FAILED".into(),
            user_id: "u1".into(),
            email: Some("a@b.com".into()),
            phone: None,
            message: "m".into(),
            meta: json!({}),
            channel: Channel::Email,
            status: Status::Failed,
            attempts: 1,
            created_at: now,
            sent_at: None,
            last_attempt_at: Some(now),
            failure: Some(FailureInfo {
                error_message: "provider down".into(),
                failed_at: now,
                next_retry_at: now + retry_delay(),
            }),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["channel"], "email");
        assert_eq!(value["errorMessage"], "provider down");
        assert!(value.get("failedAt").is_some());
        assert!(value.get("nextRetryAt").is_some());
        // Absent timestamps are omitted, not null
        assert!(value.get("sentAt").is_none());
    }

    #[test]
    fn test_failure_fields_absent_as_a_group_when_not_failed() {
        let record = Notification {
            id: Uuid::new_v4(),
            event: "X".into(),
            user_id: "u1".into(),
            email: None,
            phone: None,
            message: "m".into(),
            meta: json!({}),
            channel: Channel::InApp,
            status: Status::Pending,
            attempts: 0,
            created_at: Utc::now(),
            sent_at: None,
            last_attempt_at: None,
            failure: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("errorMessage").is_none());
        assert!(value.get("failedAt").is_none());
        assert!(value.get("nextRetryAt").is_none());
    }

    #[test]
    fn test_notify_request_deserializes_full_name_alias() {
        let req: NotifyRequest = serde_json::from_value(json!({
            "event": "X",
            "user": {"id": "u1", "fullName": "Ana Mensah"},
            "message": "m"
        }))
        .unwrap();
        let user = req.user.unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Ana Mensah"));
        assert_eq!(user.display_name(), "Ana Mensah");
    }
}
