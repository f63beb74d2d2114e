//! Health check handler

use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::services::LogCacheStats;
use crate::web::{AppState, responses::handle_result};

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub show_trajectory: bool,
    pub caches: LogCacheStats,
}

/// `GET /health`, status plus cache statistics
pub async fn health_check(State(state): State<AppState>) -> Response {
    let result = state.logs.cache_stats().await.map(|caches| HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        show_trajectory: state.logs.show_trajectory(),
        caches,
    });
    handle_result(result)
}
