use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};


lazy_static! {
    pub static ref HITS_TOTAL: Counter =
        register_counter!("limiter_hits_total", "Total number of recorded hits").unwrap();
    pub static ref HITS_REJECTED: Counter =
        register_counter!("limiter_hits_rejected_total", "Hits classified over the limit").unwrap();
    pub static ref STORE_ERRORS: Counter =
        register_counter!("limiter_store_errors_total", "Failed store operations").unwrap();
    pub static ref SWEEPS_TOTAL: Counter =
        register_counter!("limiter_sweeps_total", "Completed janitor sweeps").unwrap();
    pub static ref SWEPT_RECORDS: Counter =
        register_counter!("limiter_swept_records_total", "Hit records removed by sweeps").unwrap();
    pub static ref HIT_LATENCY: Histogram = register_histogram!(
        "limiter_hit_latency_seconds",
        "Time to record and rate a hit, lock wait included"
    )
    .unwrap();
}
