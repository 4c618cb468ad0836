use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::models::LimiterState;
use crate::state::AppState;

// health handler - 503 unless the limiter is running
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let limiter_state = state.limiter.state().await;
    let status = if limiter_state == LimiterState::Running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if status.is_success() { "healthy" } else { "unavailable" },
            "limiter": limiter_state,
            "interval_secs": state.limiter.interval().as_secs_f64(),
            "limit": state.limiter.limit(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
