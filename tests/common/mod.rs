#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hit_limiter::{HitRecord, HitStore, Limiter, LimiterConfig, MemoryStore, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub async fn running_limiter(interval: Duration, limit: u64) -> Limiter {
    let limiter = Limiter::new(
        LimiterConfig::new(interval, limit),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();
    limiter.init().await.unwrap();
    limiter
}

// Memory store that can be told to fail inserts and/or sweeps
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_inserts: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub delete_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_deletes() -> Self {
        let store = Self::default();
        store.fail_deletes.store(true, Ordering::SeqCst);
        store
    }

    pub fn failing_inserts() -> Self {
        let store = Self::default();
        store.fail_inserts.store(true, Ordering::SeqCst);
        store
    }
}

#[async_trait]
impl HitStore for FlakyStore {
    async fn reset_schema(&self) -> Result<(), StoreError> {
        self.inner.reset_schema().await
    }

    async fn insert(&self, record: &HitRecord) -> Result<(), StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Query("insert refused".to_string()));
        }
        self.inner.insert(record).await
    }

    async fn count_since(&self, identifier: &str, after: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.count_since(identifier, after).await
    }

    async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Query("delete refused".to_string()));
        }
        self.inner.delete_before(before).await
    }
}
