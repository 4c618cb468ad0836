use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::HitStore;
use crate::error::StoreError;
use crate::models::HitRecord;

// hit_time is UTC microseconds since the epoch
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .create_if_missing(true);

        // every connection to :memory: gets its own database, so keep exactly one alive
        let pool_options = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!(url = %url, "connected to sqlite hit store");
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

#[async_trait]
impl HitStore for SqliteStore {
    async fn reset_schema(&self) -> Result<(), StoreError> {
        let statements = [
            "DROP TABLE IF EXISTS hit",
            "CREATE TABLE hit (ip VARCHAR(64) NOT NULL, hit_time INTEGER NOT NULL)",
            "CREATE INDEX idx_hit_ip_time ON hit (ip, hit_time)",
        ];
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Schema(e.to_string()))?;
        }
        Ok(())
    }

    async fn insert(&self, record: &HitRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO hit (ip, hit_time) VALUES (?, ?)")
            .bind(record.identifier.as_str())
            .bind(micros(record.timestamp))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn count_since(&self, identifier: &str, after: DateTime<Utc>) -> Result<u64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM hit WHERE ip = ? AND hit_time > ?")
                .bind(identifier)
                .bind(micros(after))
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM hit WHERE hit_time < ?")
            .bind(micros(before))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
