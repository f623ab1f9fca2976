//! Error taxonomy for the webhook surface and startup configuration.
//!
//! Per-subsystem upstream failures are *not* HTTP errors: they are caught
//! inside the pipeline and reported in the response body (see
//! `clients::ClientError`). Only malformed webhooks and unexpected internal
//! failures escape to an HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error response for API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

/// Errors that escape the pipeline orchestrator
#[derive(Debug)]
pub enum AppError {
    /// Unparseable JSON, or a payload with no prompt source (400)
    MalformedWebhook(String),

    /// Unexpected internal failure (500)
    Internal(anyhow::Error),
}

impl AppError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedWebhook(_) => "MALFORMED_WEBHOOK",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedWebhook(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::MalformedWebhook(msg) => format!("Malformed webhook: {msg}"),
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Startup configuration failures. Fatal: the process must refuse to
/// serve (and never bind a port) when one of these is raised.
#[derive(Debug)]
pub enum ConfigError {
    /// Required variable is unset
    Missing(&'static str),
    /// Variable is set but empty
    Empty(&'static str),
    /// Variable is set but not an absolute http(s) URL
    InvalidUrl { name: &'static str, reason: String },
    /// Variable is set but fails numeric parsing or range checks
    InvalidValue { name: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "required environment variable {name} is not set"),
            Self::Empty(name) => write!(f, "environment variable {name} must not be empty"),
            Self::InvalidUrl { name, reason } => {
                write!(
                    f,
                    "environment variable {name} is not a valid absolute URL: {reason}"
                )
            }
            Self::InvalidValue { name, reason } => {
                write!(f, "environment variable {name} is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::MalformedWebhook("bad json".to_string()).code(),
            "MALFORMED_WEBHOOK"
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::MalformedWebhook("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Empty("GRAPHITI_URL");
        assert!(err.to_string().contains("GRAPHITI_URL"));

        let err = ConfigError::InvalidUrl {
            name: "LETTA_BASE_URL",
            reason: "relative URL without a base".to_string(),
        };
        assert!(err.to_string().contains("absolute URL"));
    }
}
