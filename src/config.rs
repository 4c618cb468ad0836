use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_LIMIT: u64 = 60;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "hit-limiter")]
#[command(about = "Per-client request rate limiter over a trailing window")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Trailing window in seconds
    #[arg(short, long, default_value_t = 60)]
    pub interval: u64,

    // Max hits allowed inside the window
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u64,

    // Backing store: "memory" or a sqlite url
    // Example: "sqlite://hits.db" or "sqlite::memory:"
    #[arg(short, long, default_value = "memory")]
    pub store: String,
}

impl Args {
    pub fn limiter_config(&self) -> Result<LimiterConfig, ConfigError> {
        let config = LimiterConfig {
            interval: Duration::from_secs(self.interval),
            limit: self.limit,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn store_kind(&self) -> Result<StoreKind, ConfigError> {
        self.store.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub interval: Duration,
    pub limit: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl LimiterConfig {
    pub fn new(interval: Duration, limit: u64) -> Self {
        Self { interval, limit }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        interval_nanos(self.interval).map(|_| ())
    }
}

// interval as stored by the limiter, zero and overflowing values rejected
pub fn interval_nanos(interval: Duration) -> Result<u64, ConfigError> {
    if interval.is_zero() {
        return Err(ConfigError::ZeroInterval);
    }
    u64::try_from(interval.as_nanos()).map_err(|_| ConfigError::IntervalTooLong(interval))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Sqlite(String),
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("memory") {
            return Ok(StoreKind::Memory);
        }
        if s.starts_with("sqlite:") {
            return Ok(StoreKind::Sqlite(s.to_string()));
        }
        Err(ConfigError::UnsupportedStore(s.to_string()))
    }
}
