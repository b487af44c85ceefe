//! Notification record storage.
//!
//! The store is a document-style adapter: create, fetch by id, apply a
//! field-wise update, and query by user. Timestamps are assigned by the
//! store at write time so retries stay consistent under clock skew, and
//! clearing the failure fields is an explicit delete, distinct from
//! setting them to an empty value.
//!
//! Backends:
//! - `MemoryStore`: in-memory storage using DashMap (default)
//! - `PostgresStore`: persistent storage using sqlx
//!
//! Use `create_store()` to pick the backend from configuration.

mod factory;
mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::notification::{NewNotification, Notification, Status};

pub use factory::create_store;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Notification {0} not found")]
    NotFound(Uuid),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Update to the failure fields, applied as one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FailureUpdate {
    /// Leave the failure fields untouched
    #[default]
    Keep,
    /// Record a failed attempt: the store assigns `failed_at = now` and
    /// `next_retry_at = now + retry_delay()`
    Set { error_message: String },
    /// Remove `error_message`, `failed_at`, and `next_retry_at` entirely
    Clear,
}

/// Field-wise update instruction for one record.
///
/// Mirrors document-store update semantics: each field operation (set,
/// increment, delete) is individually atomic, but the update as a whole
/// is not transactional with concurrent updates to the same record.
#[derive(Debug, Clone, Default)]
pub struct NotificationUpdate {
    pub status: Option<Status>,
    /// Increment `attempts` by one and set `last_attempt_at = now`
    pub record_attempt: bool,
    /// Set `sent_at = now`
    pub mark_sent: bool,
    pub failure: FailureUpdate,
}

impl NotificationUpdate {
    /// A first delivery attempt succeeded.
    pub fn sent() -> Self {
        Self {
            status: Some(Status::Sent),
            record_attempt: true,
            mark_sent: true,
            failure: FailureUpdate::Keep,
        }
    }

    /// A retry succeeded: also clears the failure fields left by the
    /// earlier failed attempt.
    pub fn retry_succeeded() -> Self {
        Self {
            status: Some(Status::Sent),
            record_attempt: true,
            mark_sent: true,
            failure: FailureUpdate::Clear,
        }
    }

    /// A delivery attempt failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Failed),
            record_attempt: true,
            mark_sent: false,
            failure: FailureUpdate::Set {
                error_message: reason.into(),
            },
        }
    }
}

/// Storage backend for notification records.
///
/// Implementations must be thread-safe (`Send + Sync`); they are shared
/// across request tasks behind an `Arc`.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a new record. The store assigns the id and `created_at`;
    /// the record starts `pending` with zero attempts.
    async fn create(&self, new: NewNotification) -> Result<Notification, StoreError>;

    /// Fetch a record by id. `None` if it does not exist.
    async fn get(&self, id: Uuid) -> Result<Option<Notification>, StoreError>;

    /// Apply a field-wise update to an existing record.
    async fn apply(&self, id: Uuid, update: NotificationUpdate) -> Result<(), StoreError>;

    /// All records for a user, ordered by creation time, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, StoreError>;
}
