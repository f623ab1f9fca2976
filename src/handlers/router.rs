//! Route table

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;
use super::{health, webhook};

/// Build the complete router.
///
/// `/webhook/letta` is an exact alias of `/webhook`; both hit the same
/// handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::receive_webhook))
        .route("/webhook/letta", post(webhook::receive_webhook))
        .route("/health", get(health::health))
        .route("/agent-tracker/status", get(health::tracker_status))
        .route("/agent-tracker/reset", post(health::tracker_reset))
        .with_state(state)
}
