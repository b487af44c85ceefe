//! PostgreSQL-backed notification store.
//!
//! Records live in a single `notifications` table. All timestamps are
//! computed server-side with `NOW()`, and updates are applied field-wise
//! in one statement so increment/set/delete semantics match the
//! document-store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::notification::{
    retry_delay, Channel, FailureInfo, NewNotification, Notification, Status,
};

use super::{FailureUpdate, NotificationStore, NotificationUpdate, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id UUID PRIMARY KEY,
    event TEXT NOT NULL,
    user_id TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    message TEXT NOT NULL,
    meta JSONB NOT NULL DEFAULT '{}'::jsonb,
    channel TEXT NOT NULL,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    sent_at TIMESTAMPTZ,
    last_attempt_at TIMESTAMPTZ,
    error_message TEXT,
    failed_at TIMESTAMPTZ,
    next_retry_at TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS idx_notifications_user_created
    ON notifications (user_id, created_at DESC);
"#;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and bootstrap the schema.
    pub async fn connect(config: &DatabaseConfig, url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .connect(url)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        tracing::info!(pool_size = config.pool_size, "PostgreSQL store ready");
        Ok(store)
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    event: String,
    user_id: String,
    email: Option<String>,
    phone: Option<String>,
    message: String,
    meta: serde_json::Value,
    channel: String,
    status: String,
    attempts: i32,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    last_attempt_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    failed_at: Option<DateTime<Utc>>,
    next_retry_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let channel = Channel::parse(&row.channel)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown channel {:?}", row.channel)))?;
        let status = match row.status.as_str() {
            "pending" => Status::Pending,
            "sent" => Status::Sent,
            "failed" => Status::Failed,
            other => return Err(StoreError::Corrupt(format!("unknown status {other:?}"))),
        };
        let failure = match (row.error_message, row.failed_at, row.next_retry_at) {
            (Some(error_message), Some(failed_at), Some(next_retry_at)) => Some(FailureInfo {
                error_message,
                failed_at,
                next_retry_at,
            }),
            (None, None, None) => None,
            _ => {
                return Err(StoreError::Corrupt(format!(
                    "partial failure fields on {}",
                    row.id
                )))
            }
        };

        Ok(Notification {
            id: row.id,
            event: row.event,
            user_id: row.user_id,
            email: row.email,
            phone: row.phone,
            message: row.message,
            meta: row.meta,
            channel,
            status,
            attempts: row.attempts.max(0) as u32,
            created_at: row.created_at,
            sent_at: row.sent_at,
            last_attempt_at: row.last_attempt_at,
            failure,
        })
    }
}

const SELECT_COLUMNS: &str = "id, event, user_id, email, phone, message, meta, channel, status, \
     attempts, created_at, sent_at, last_attempt_at, error_message, failed_at, next_retry_at";

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let id = Uuid::new_v4();
        let row: NotificationRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO notifications (id, event, user_id, email, phone, message, meta, channel, status, attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', 0, NOW())
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&new.event)
        .bind(&new.user_id)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.message)
        .bind(&new.meta)
        .bind(new.channel.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>, StoreError> {
        let row: Option<NotificationRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Notification::try_from).transpose()
    }

    async fn apply(&self, id: Uuid, update: NotificationUpdate) -> Result<(), StoreError> {
        let (set_failure, error_message, clear_failure) = match update.failure {
            FailureUpdate::Keep => (false, None, false),
            FailureUpdate::Set { error_message } => (true, Some(error_message), false),
            FailureUpdate::Clear => (false, None, true),
        };
        let attempt_inc: i32 = if update.record_attempt { 1 } else { 0 };

        let result = sqlx::query(
            r#"
            UPDATE notifications SET
                status = COALESCE($2, status),
                attempts = attempts + $3,
                last_attempt_at = CASE WHEN $3 > 0 THEN NOW() ELSE last_attempt_at END,
                sent_at = CASE WHEN $4 THEN NOW() ELSE sent_at END,
                error_message = CASE WHEN $5 THEN $6 WHEN $7 THEN NULL ELSE error_message END,
                failed_at = CASE WHEN $5 THEN NOW() WHEN $7 THEN NULL ELSE failed_at END,
                next_retry_at = CASE WHEN $5 THEN NOW() + make_interval(secs => $8)
                                     WHEN $7 THEN NULL ELSE next_retry_at END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(attempt_inc)
        .bind(update.mark_sent)
        .bind(set_failure)
        .bind(error_message)
        .bind(clear_failure)
        .bind(retry_delay().num_seconds() as f64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, StoreError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }
}
