use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{LimiterConfig, interval_nanos};
use crate::error::{ConfigError, LimitError, StoreError};
use crate::janitor::Janitor;
use crate::metrics::{
    HIT_LATENCY, HITS_REJECTED, HITS_TOTAL, STORE_ERRORS, SWEEPS_TOTAL, SWEPT_RECORDS,
};
use crate::models::{HitRecord, LimiterState};
use crate::store::{HitStore, MemoryStore};

// Cheap to clone, every clone shares store, lock and configuration
#[derive(Clone)]
pub struct Limiter {
    inner: Arc<Inner>,
}

struct Inner {
    interval_nanos: AtomicU64,
    limit: AtomicU64,
    store: Arc<dyn HitStore>,
    // held for the whole of every insert, count and sweep
    gate: Mutex<()>,
    lifecycle: Mutex<Lifecycle>,
}

struct Lifecycle {
    state: LimiterState,
    janitor: Option<Janitor>,
}

// The janitor only keeps this, so dropping every Limiter ends it too
pub(crate) struct WeakLimiter(Weak<Inner>);

impl WeakLimiter {
    pub(crate) fn upgrade(&self) -> Option<Limiter> {
        self.0.upgrade().map(|inner| Limiter { inner })
    }
}

impl Limiter {
    pub fn new(config: LimiterConfig, store: Arc<dyn HitStore>) -> Result<Self, ConfigError> {
        let nanos = interval_nanos(config.interval)?;
        Ok(Self::build(nanos, config.limit, store))
    }

    // 60 hits per minute, in-memory store, already running
    pub async fn start_default() -> Result<Self, StoreError> {
        let config = LimiterConfig::default();
        let nanos = config.interval.as_nanos() as u64;
        let limiter = Self::build(nanos, config.limit, Arc::new(MemoryStore::new()));
        limiter.init().await?;
        Ok(limiter)
    }

    fn build(interval_nanos: u64, limit: u64, store: Arc<dyn HitStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                interval_nanos: AtomicU64::new(interval_nanos),
                limit: AtomicU64::new(limit),
                store,
                gate: Mutex::new(()),
                lifecycle: Mutex::new(Lifecycle {
                    state: LimiterState::Uninitialized,
                    janitor: None,
                }),
            }),
        }
    }

    // Destructive: drops and recreates the hit table, then (re)starts the janitor
    pub async fn init(&self) -> Result<(), StoreError> {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if lifecycle.state != LimiterState::Uninitialized {
            warn!(
                state = ?lifecycle.state,
                "re-initializing limiter, existing hit history is discarded"
            );
        }
        if let Some(previous) = lifecycle.janitor.take() {
            previous.stop().await;
        }

        let reset = {
            let _gate = self.inner.gate.lock().await;
            self.inner.store.reset_schema().await
        };
        if let Err(e) = reset {
            STORE_ERRORS.inc();
            lifecycle.state = LimiterState::Uninitialized;
            return Err(e);
        }

        lifecycle.state = LimiterState::Initialized;
        lifecycle.janitor = Some(Janitor::spawn(self.downgrade()));
        lifecycle.state = LimiterState::Running;

        info!(
            interval = ?self.interval(),
            limit = self.limit(),
            "limiter running"
        );
        Ok(())
    }

    pub async fn shutdown(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if let Some(janitor) = lifecycle.janitor.take() {
            janitor.stop().await;
        }
        if lifecycle.state != LimiterState::Uninitialized {
            lifecycle.state = LimiterState::Stopped;
        }
        info!("limiter stopped");
    }

    pub async fn state(&self) -> LimiterState {
        self.inner.lifecycle.lock().await.state
    }

    pub async fn janitor_running(&self) -> bool {
        self.inner
            .lifecycle
            .lock()
            .await
            .janitor
            .as_ref()
            .is_some_and(|janitor| !janitor.is_finished())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.inner.interval_nanos.load(Ordering::Relaxed))
    }

    pub fn limit(&self) -> u64 {
        self.inner.limit.load(Ordering::Relaxed)
    }

    // picked up by the next evaluated hit and the janitor's next cycle
    pub fn set_interval(&self, interval: Duration) -> Result<(), ConfigError> {
        let nanos = interval_nanos(interval)?;
        self.inner.interval_nanos.store(nanos, Ordering::Relaxed);
        Ok(())
    }

    pub fn set_limit(&self, limit: u64) {
        self.inner.limit.store(limit, Ordering::Relaxed);
    }

    pub fn store(&self) -> &Arc<dyn HitStore> {
        &self.inner.store
    }

    pub async fn hit(&self, identifier: &str) -> Result<(), StoreError> {
        let _gate = self.inner.gate.lock().await;
        self.record(identifier).await
    }

    // hits inside (now - interval, now]
    pub async fn rate(&self, identifier: &str) -> Result<u64, StoreError> {
        let _gate = self.inner.gate.lock().await;
        self.count(identifier).await
    }

    // rate == limit still passes; rejected hits stay recorded and keep counting
    pub async fn hit_or_reject(&self, identifier: &str) -> Result<u64, LimitError> {
        let started = Instant::now();
        let rate = {
            let _gate = self.inner.gate.lock().await;
            self.record(identifier).await?;
            self.count(identifier).await?
        };
        HIT_LATENCY.observe(started.elapsed().as_secs_f64());

        let limit = self.limit();
        if rate > limit {
            HITS_REJECTED.inc();
            debug!(identifier, rate, limit, "rate limit exceeded");
            return Err(LimitError::RateLimitExceeded { rate, limit });
        }
        Ok(rate)
    }

    pub async fn sweep(&self) -> Result<u64, StoreError> {
        let _gate = self.inner.gate.lock().await;
        let before = window_start(Utc::now(), self.interval().saturating_mul(2));
        let removed = self
            .inner
            .store
            .delete_before(before)
            .await
            .inspect_err(|_| STORE_ERRORS.inc())?;

        SWEEPS_TOTAL.inc();
        SWEPT_RECORDS.inc_by(removed as f64);
        Ok(removed)
    }

    pub(crate) fn downgrade(&self) -> WeakLimiter {
        WeakLimiter(Arc::downgrade(&self.inner))
    }

    // callers hold the gate
    async fn record(&self, identifier: &str) -> Result<(), StoreError> {
        let record = HitRecord::now(identifier);
        self.inner
            .store
            .insert(&record)
            .await
            .inspect_err(|_| STORE_ERRORS.inc())?;
        HITS_TOTAL.inc();
        Ok(())
    }

    // callers hold the gate
    async fn count(&self, identifier: &str) -> Result<u64, StoreError> {
        let after = window_start(Utc::now(), self.interval());
        self.inner
            .store
            .count_since(identifier, after)
            .await
            .inspect_err(|_| STORE_ERRORS.inc())
    }
}

// now - span, clamped to the earliest representable instant
fn window_start(now: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(span)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
