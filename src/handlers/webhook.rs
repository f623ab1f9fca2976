//! Webhook handlers
//!
//! The body is taken as raw text and parsed by hand so the status-code
//! contract stays exact: 400 for unparseable JSON or a payload with no
//! prompt source, 200 with per-subsystem outcomes for everything else.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::warn;

use super::state::AppState;
use super::types::WebhookEvent;
use crate::errors::AppError;
use crate::pipeline;

/// POST /webhook and POST /webhook/letta (identical behavior)
pub async fn receive_webhook(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let event: WebhookEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Rejecting unparseable webhook body: {e}");
            return AppError::MalformedWebhook(format!("could not parse request body as JSON: {e}"))
                .into_response();
        }
    };

    match pipeline::process_webhook(&state, event).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}
