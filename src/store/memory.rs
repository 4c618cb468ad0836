use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::HitStore;
use crate::error::StoreError;
use crate::models::HitRecord;

// In-process store: identifier -> hit timestamps in insertion order
#[derive(Default)]
pub struct MemoryStore {
    hits: DashMap<String, Vec<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Total records across every identifier
    pub fn len(&self) -> usize {
        self.hits.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl HitStore for MemoryStore {
    async fn reset_schema(&self) -> Result<(), StoreError> {
        self.hits.clear();
        Ok(())
    }

    async fn insert(&self, record: &HitRecord) -> Result<(), StoreError> {
        self.hits
            .entry(record.identifier.clone())
            .or_default()
            .push(record.timestamp);
        Ok(())
    }

    async fn count_since(&self, identifier: &str, after: DateTime<Utc>) -> Result<u64, StoreError> {
        let count = self
            .hits
            .get(identifier)
            .map(|times| times.iter().filter(|t| **t > after).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut removed = 0usize;
        self.hits.retain(|_, times| {
            let len = times.len();
            times.retain(|t| *t >= before);
            removed += len - times.len();
            // drop identifiers with nothing left
            !times.is_empty()
        });
        Ok(removed as u64)
    }
}
