mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::StoreKind;
use crate::error::StoreError;
use crate::models::HitRecord;

// every call is made under the limiter's lock
#[async_trait]
pub trait HitStore: Send + Sync {
    // drops and recreates the table, all prior records are lost
    async fn reset_schema(&self) -> Result<(), StoreError>;

    async fn insert(&self, record: &HitRecord) -> Result<(), StoreError>;

    // both bounds below are strict
    async fn count_since(&self, identifier: &str, after: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}

// Build the store selected on the command line
pub async fn open(kind: &StoreKind) -> Result<Arc<dyn HitStore>, StoreError> {
    match kind {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::Sqlite(url) => Ok(Arc::new(SqliteStore::connect(url).await?)),
    }
}
