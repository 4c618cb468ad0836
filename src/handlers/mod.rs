mod health;
mod metrics;
mod hit;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use hit::{client_identifier, hit_handler, rate_handler};

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::state::AppState;

// all routes exposed by the binary
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/hit", get(hit_handler))
        .route("/rate", get(rate_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
