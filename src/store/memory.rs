//! In-memory notification store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::notification::{retry_delay, FailureInfo, NewNotification, Notification, Status};

use super::{FailureUpdate, NotificationStore, NotificationUpdate, StoreError};

/// DashMap-backed store. The default backend; also what every test runs
/// against.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<Uuid, Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records. Test helper.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let record = Notification {
            id: Uuid::new_v4(),
            event: new.event,
            user_id: new.user_id,
            email: new.email,
            phone: new.phone,
            message: new.message,
            meta: new.meta,
            channel: new.channel,
            status: Status::Pending,
            attempts: 0,
            created_at: Utc::now(),
            sent_at: None,
            last_attempt_at: None,
            failure: None,
        };
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn apply(&self, id: Uuid, update: NotificationUpdate) -> Result<(), StoreError> {
        let mut record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let now = Utc::now();

        if let Some(status) = update.status {
            record.status = status;
        }
        if update.record_attempt {
            record.attempts += 1;
            record.last_attempt_at = Some(now);
        }
        if update.mark_sent {
            record.sent_at = Some(now);
        }
        match update.failure {
            FailureUpdate::Keep => {}
            FailureUpdate::Set { error_message } => {
                record.failure = Some(FailureInfo {
                    error_message,
                    failed_at: now,
                    next_retry_at: now + retry_delay(),
                });
            }
            FailureUpdate::Clear => {
                record.failure = None;
            }
        }

        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, StoreError> {
        let mut records: Vec<Notification> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
