use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("schema setup failed: {0}")]
    Schema(String),

    #[error("store query failed: {0}")]
    Query(String),
}

// what hit_or_reject returns when a hit is not accepted
#[derive(Debug, Error)]
pub enum LimitError {
    // not a fault, the caller should deny the request
    #[error("rate limit exceeded: {rate} hits in window, limit is {limit}")]
    RateLimitExceeded { rate: u64, limit: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LimitError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LimitError::RateLimitExceeded { .. })
    }

    // none when the store failed before counting
    pub fn rate(&self) -> Option<u64> {
        match self {
            LimitError::RateLimitExceeded { rate, .. } => Some(*rate),
            LimitError::Store(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("interval must be greater than zero")]
    ZeroInterval,

    #[error("interval {0:?} does not fit in u64 nanoseconds")]
    IntervalTooLong(Duration),

    #[error("unsupported store '{0}', expected 'memory' or a sqlite: url")]
    UnsupportedStore(String),
}

// Body stays "Error\n" for both kinds so existing clients keep parsing it,
// the status code is what tells them apart.
impl IntoResponse for LimitError {
    fn into_response(self) -> Response {
        let status = match &self {
            LimitError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            LimitError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, "Error\n").into_response()
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        LimitError::Store(self).into_response()
    }
}
