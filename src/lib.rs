pub mod config;
pub mod error;
pub mod handlers;
pub mod janitor;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod store;

pub use config::{Args, LimiterConfig, StoreKind};
pub use error::{ConfigError, LimitError, StoreError};
pub use models::{HitRecord, LimiterState};
pub use rate_limit::Limiter;
pub use state::AppState;
pub use store::{HitStore, MemoryStore, SqliteStore};
