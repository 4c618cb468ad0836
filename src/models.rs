use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// One observed request. Never updated, only removed by the janitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub identifier: String,           // client key, usually an ip
    pub timestamp: DateTime<Utc>,     // when the hit was recorded
}

impl HitRecord {
    pub fn new(identifier: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp,
        }
    }

    // Hit stamped with the current instant
    pub fn now(identifier: impl Into<String>) -> Self {
        Self::new(identifier, Utc::now())
    }
}

// Lifecycle of a limiter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}
