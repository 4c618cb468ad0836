use crate::rate_limit::Limiter;

// app's shared state, handed to every handler through axum's State extractor
pub struct AppState {
    pub limiter: Limiter,
}

impl AppState {
    pub fn new(limiter: Limiter) -> Self {
        Self { limiter }
    }
}
