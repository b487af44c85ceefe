//! Store backend factory

use std::sync::Arc;

use crate::config::DatabaseConfig;

use super::memory::MemoryStore;
use super::postgres::PostgresStore;
use super::{NotificationStore, StoreError};

/// Create a notification store based on configuration.
///
/// - `"postgres"`: connects and bootstraps the schema; requires
///   `database.url`
/// - `"memory"` (default): in-process store, records are lost on restart
pub async fn create_store(config: &DatabaseConfig) -> Result<Arc<dyn NotificationStore>, StoreError> {
    match config.backend.as_str() {
        "postgres" => {
            if let Some(url) = &config.url {
                tracing::info!(backend = "postgres", "Creating PostgreSQL notification store");
                Ok(Arc::new(PostgresStore::connect(config, url).await?))
            } else {
                tracing::warn!(
                    "PostgreSQL backend requested but no database.url provided, falling back to memory"
                );
                Ok(Arc::new(MemoryStore::new()))
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory notification store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
