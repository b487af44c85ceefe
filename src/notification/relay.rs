//! Notification lifecycle controller.
//!
//! Owns the create -> attempt -> record-outcome -> retry flow. Records
//! are always persisted before any delivery attempt so a request is
//! never silently lost, and a delivery failure is written back to the
//! record instead of rolling it back.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::delivery::EmailClient;
use crate::error::{AppError, Result};
use crate::store::{NotificationStore, NotificationUpdate};
use crate::template;

use super::types::{Channel, NewNotification, Notification, NotifyRequest, Recipient};

/// Subject line for first-attempt deliveries.
const NOTIFY_SUBJECT: &str = "Hostel App Notification";

/// Outcome of a notify request. The id is valid even when `sent` is
/// false: the record exists either way.
#[derive(Debug, Clone, Copy)]
pub struct NotifyOutcome {
    pub id: Uuid,
    pub sent: bool,
}

pub struct NotificationRelay {
    store: Arc<dyn NotificationStore>,
    email: Arc<dyn EmailClient>,
}

impl NotificationRelay {
    pub fn new(store: Arc<dyn NotificationStore>, email: Arc<dyn EmailClient>) -> Self {
        Self { store, email }
    }

    /// Create a record and, for the email channel, attempt delivery.
    ///
    /// Validation failures reject before anything is persisted. Once the
    /// record exists, a failed delivery surfaces as `AppError::Delivery`
    /// carrying the record id; the failure is also written to the record
    /// so it can be retried later.
    ///
    /// Delivery is only wired for `channel = email`; sms and in_app
    /// records are created and left `pending`.
    pub async fn notify(&self, req: NotifyRequest) -> Result<NotifyOutcome> {
        let user = req.user.unwrap_or_default();

        let (event, user_id, message) = match (req.event, user.id.clone(), req.message) {
            (Some(event), Some(user_id), Some(message))
                if !event.is_empty() && !user_id.is_empty() && !message.is_empty() =>
            {
                (event, user_id, message)
            }
            _ => return Err(AppError::Validation("Missing required fields".into())),
        };

        let channel = match req.channel.as_deref() {
            None => Channel::default(),
            Some(raw) => Channel::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unsupported channel: {raw}")))?,
        };

        // Persist first, so the notification survives a failed delivery
        let record = self
            .store
            .create(NewNotification {
                event: event.clone(),
                user_id,
                email: user.email.clone(),
                phone: user.phone.clone(),
                message,
                meta: req.data.clone().unwrap_or_else(|| json!({})),
                channel,
            })
            .await?;

        if channel != Channel::Email {
            tracing::debug!(
                id = %record.id,
                channel = %channel,
                "No delivery wired for channel, record left pending"
            );
            return Ok(NotifyOutcome {
                id: record.id,
                sent: false,
            });
        }

        // The delivered body is always rendered from the template; the
        // caller-supplied message stays on the record for retries
        let data = req.data.unwrap_or(Value::Null);
        let body = template::render(&event, user.display_name(), &data);

        let attempt: std::result::Result<(), String> = match &record.email {
            Some(to) => self
                .email
                .send_email(to, NOTIFY_SUBJECT, &body)
                .await
                .map_err(|e| e.to_string()),
            None => Err("User email missing".to_string()),
        };

        match attempt {
            Ok(()) => {
                self.store.apply(record.id, NotificationUpdate::sent()).await?;
                tracing::info!(id = %record.id, event = %event, "Notification delivered");
                Ok(NotifyOutcome {
                    id: record.id,
                    sent: true,
                })
            }
            Err(reason) => {
                self.store
                    .apply(record.id, NotificationUpdate::failed(reason.clone()))
                    .await?;
                tracing::warn!(
                    id = %record.id,
                    event = %event,
                    error = %reason,
                    "Delivery failed, recorded for retry"
                );
                Err(AppError::Delivery {
                    id: record.id,
                    reason,
                })
            }
        }
    }

    /// Re-send an existing record's stored message.
    ///
    /// Only email records can be retried. `next_retry_at` is advisory
    /// and not checked here.
    pub async fn retry(&self, id: Uuid) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found".into()))?;

        if record.channel != Channel::Email {
            return Err(AppError::UnsupportedChannel(
                "Retry only supports email for now".into(),
            ));
        }
        let to = record
            .email
            .as_deref()
            .ok_or_else(|| AppError::Validation("Missing email".into()))?;

        let subject = format!("Hostel App: {}", record.event);
        match self.email.send_email(to, &subject, &record.message).await {
            Ok(()) => {
                self.store
                    .apply(id, NotificationUpdate::retry_succeeded())
                    .await?;
                tracing::info!(id = %id, "Retry delivered");
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                self.store
                    .apply(id, NotificationUpdate::failed(reason.clone()))
                    .await?;
                tracing::warn!(id = %id, error = %reason, "Retry failed");
                Err(AppError::Delivery { id, reason })
            }
        }
    }

    /// All records for a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    /// Render a template without persisting or delivering anything.
    pub fn preview(&self, event: &str, user: &Recipient, data: &Value) -> String {
        template::render(event, user.display_name(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryError;
    use crate::notification::Status;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct SentEmail {
        to: String,
        subject: String,
        body: String,
    }

    #[derive(Default)]
    struct MockEmailClient {
        fail: AtomicBool,
        sent: Mutex<Vec<SentEmail>>,
    }

    impl MockEmailClient {
        fn failing() -> Self {
            let client = Self::default();
            client.fail.store(true, Ordering::SeqCst);
            client
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn sent(&self) -> Vec<SentEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailClient for MockEmailClient {
        async fn send_email(
            &self,
            to: &str,
            subject: &str,
            body: &str,
        ) -> std::result::Result<(), DeliveryError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DeliveryError::Rejected("mail provider unavailable".into()));
            }
            self.sent.lock().unwrap().push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }

    fn setup(
        client: MockEmailClient,
    ) -> (NotificationRelay, Arc<MemoryStore>, Arc<MockEmailClient>) {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(client);
        let relay = NotificationRelay::new(store.clone(), client.clone());
        (relay, store, client)
    }

    fn email_request() -> NotifyRequest {
        NotifyRequest {
            event: Some("BOOKING_CREATED".into()),
            channel: Some("email".into()),
            user: Some(Recipient {
                id: Some("u1".into()),
                name: Some("Ana".into()),
                email: Some("a@b.com".into()),
                ..Default::default()
            }),
            message: Some("ignored".into()),
            data: Some(json!({"bookingId": "B1", "room": "12A"})),
        }
    }

    #[tokio::test]
    async fn test_notify_success_marks_sent_with_one_attempt() {
        let (relay, store, client) = setup(MockEmailClient::default());

        let outcome = relay.notify(email_request()).await.unwrap();
        assert!(outcome.sent);

        let record = store.get(outcome.id).await.unwrap().unwrap();
        assert_eq!(record.status, Status::Sent);
        assert_eq!(record.attempts, 1);
        assert!(record.sent_at.is_some());
        assert!(record.failure.is_none());

        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert_eq!(sent[0].subject, "Hostel App Notification");
        // Delivered body comes from the template, not the caller message
        assert!(sent[0].body.contains("Booking ID: B1"));
        assert!(!sent[0].body.contains("ignored"));
    }

    #[tokio::test]
    async fn test_notify_failure_still_persists_the_record() {
        let (relay, store, _client) = setup(MockEmailClient::failing());

        let err = relay.notify(email_request()).await.unwrap_err();
        let id = match err {
            AppError::Delivery { id, reason } => {
                assert!(reason.contains("mail provider unavailable"));
                id
            }
            other => panic!("expected Delivery error, got {other:?}"),
        };

        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, Status::Failed);
        assert_eq!(record.attempts, 1);
        let failure = record.failure.expect("failure fields present");
        assert!(failure.error_message.contains("mail provider unavailable"));
        assert!(failure.next_retry_at > failure.failed_at);
    }

    #[tokio::test]
    async fn test_notify_validation_rejects_before_persistence() {
        let (relay, store, _client) = setup(MockEmailClient::default());

        let missing_event = NotifyRequest {
            event: None,
            ..email_request()
        };
        let err = relay.notify(missing_event).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let no_user_id = NotifyRequest {
            user: Some(Recipient {
                email: Some("a@b.com".into()),
                ..Default::default()
            }),
            ..email_request()
        };
        assert!(matches!(
            relay.notify(no_user_id).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let no_message = NotifyRequest {
            message: None,
            ..email_request()
        };
        assert!(matches!(
            relay.notify(no_message).await.unwrap_err(),
            AppError::Validation(_)
        ));

        assert!(store.is_empty(), "validation failures must not persist");
    }

    #[tokio::test]
    async fn test_notify_missing_email_is_a_recorded_delivery_failure() {
        let (relay, store, _client) = setup(MockEmailClient::default());

        let mut req = email_request();
        req.user.as_mut().unwrap().email = None;

        let err = relay.notify(req).await.unwrap_err();
        let id = match err {
            AppError::Delivery { id, reason } => {
                assert_eq!(reason, "User email missing");
                id
            }
            other => panic!("expected Delivery error, got {other:?}"),
        };

        // Creation succeeded; only the attempt failed
        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, Status::Failed);
        assert_eq!(record.attempts, 1);
    }

    #[tokio::test]
    async fn test_notify_non_email_channels_stay_pending() {
        let (relay, store, client) = setup(MockEmailClient::default());

        for channel in ["sms", "in_app"] {
            let mut req = email_request();
            req.channel = Some(channel.into());
            let outcome = relay.notify(req).await.unwrap();
            assert!(!outcome.sent);

            let record = store.get(outcome.id).await.unwrap().unwrap();
            assert_eq!(record.status, Status::Pending);
            assert_eq!(record.attempts, 0);
        }

        // Channel defaults to in_app when omitted
        let mut req = email_request();
        req.channel = None;
        let outcome = relay.notify(req).await.unwrap();
        let record = store.get(outcome.id).await.unwrap().unwrap();
        assert_eq!(record.channel, Channel::InApp);
        assert_eq!(record.status, Status::Pending);

        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn test_notify_unknown_channel_is_rejected() {
        let (relay, store, _client) = setup(MockEmailClient::default());

        let mut req = email_request();
        req.channel = Some("push".into());
        assert!(matches!(
            relay.notify(req).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_retry_clears_failure_fields_and_resends_stored_message() {
        let (relay, store, client) = setup(MockEmailClient::failing());

        let err = relay.notify(email_request()).await.unwrap_err();
        let AppError::Delivery { id, .. } = err else {
            panic!("expected Delivery error");
        };

        client.set_failing(false);
        relay.retry(id).await.unwrap();

        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, Status::Sent);
        assert_eq!(record.attempts, 2);
        assert!(record.failure.is_none());
        assert!(record.sent_at.is_some());

        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        // Retry sends the stored message as-is, not a re-rendered template
        assert_eq!(sent[0].body, "ignored");
        assert_eq!(sent[0].subject, "Hostel App: BOOKING_CREATED");
    }

    #[tokio::test]
    async fn test_retry_failure_increments_attempts_again() {
        let (relay, store, _client) = setup(MockEmailClient::failing());

        let AppError::Delivery { id, .. } = relay.notify(email_request()).await.unwrap_err()
        else {
            panic!("expected Delivery error");
        };

        // Provider still down
        let err = relay.retry(id).await.unwrap_err();
        assert!(matches!(err, AppError::Delivery { .. }));

        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, Status::Failed);
        assert_eq!(record.attempts, 2);
        assert!(record.failure.is_some());
    }

    #[tokio::test]
    async fn test_retry_unknown_id_is_not_found() {
        let (relay, _store, _client) = setup(MockEmailClient::default());
        assert!(matches!(
            relay.retry(Uuid::new_v4()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_retry_non_email_channel_mutates_nothing() {
        let (relay, store, _client) = setup(MockEmailClient::default());

        let mut req = email_request();
        req.channel = Some("sms".into());
        req.user.as_mut().unwrap().phone = Some("+233200000000".into());
        let outcome = relay.notify(req).await.unwrap();

        let err = relay.retry(outcome.id).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedChannel(_)));

        let record = store.get(outcome.id).await.unwrap().unwrap();
        assert_eq!(record.status, Status::Pending);
        assert_eq!(record.attempts, 0);
    }

    #[tokio::test]
    async fn test_retry_without_email_address_is_rejected() {
        let (relay, _store, client) = setup(MockEmailClient::default());

        let mut req = email_request();
        req.user.as_mut().unwrap().email = None;
        let AppError::Delivery { id, .. } = relay.notify(req).await.unwrap_err() else {
            panic!("expected Delivery error");
        };

        let err = relay.retry(id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn test_list_for_user_returns_newest_first() {
        let (relay, _store, _client) = setup(MockEmailClient::default());

        let first = relay.notify(email_request()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = relay.notify(email_request()).await.unwrap();

        let records = relay.list_for_user("u1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1].id, first.id);

        assert!(relay.list_for_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_persists_nothing() {
        let (relay, store, _client) = setup(MockEmailClient::default());

        let user = Recipient {
            name: Some("Ana".into()),
            ..Default::default()
        };
        let preview = relay.preview("PAYMENT_SUCCESS", &user, &json!({}));
        assert!(preview.contains("Hello Ana"));
        assert!(store.is_empty());
    }
}
