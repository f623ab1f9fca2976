//! Health and agent-tracker introspection handlers

use axum::{extract::State, response::Json};
use serde::Serialize;

use super::state::AppState;
use crate::tracker::TrackerStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /agent-tracker/status
pub async fn tracker_status(State(state): State<AppState>) -> Json<TrackerStatus> {
    Json(state.tracker.status())
}

#[derive(Serialize)]
pub struct TrackerResetResponse {
    pub message: String,
    pub cleared: usize,
}

/// POST /agent-tracker/reset
pub async fn tracker_reset(State(state): State<AppState>) -> Json<TrackerResetResponse> {
    let cleared = state.tracker.reset();
    Json(TrackerResetResponse {
        message: format!("Reset agent tracker. Removed {cleared} agents."),
        cleared,
    })
}
