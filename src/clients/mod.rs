//! Typed HTTP clients for the backing services
//!
//! Each client owns its own `reqwest::Client` with the per-service
//! timeout baked in. Failures surface as [`ClientError`] so callers can
//! distinguish a 404 (drives the create path for memory blocks) from
//! transport problems and other upstream statuses.

pub mod graphiti;
pub mod letta;
pub mod matrix;
pub mod registry;
pub mod retry;
pub mod tools;

use std::fmt;

/// Error from an outbound service call
#[derive(Debug)]
pub enum ClientError {
    /// Upstream returned a non-2xx status
    Http { status: u16, body: String },
    /// Connection, timeout, or other transport failure
    Transport(String),
    /// Response body did not match the expected shape
    Decode(String),
}

impl ClientError {
    /// True for a 404, which converts an update into a create
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, body } => {
                let snippet: String = body.chars().take(200).collect();
                write!(f, "HTTP {status}: {snippet}")
            }
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Decode(msg) => write!(f, "unexpected response shape: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Map a non-2xx response to `ClientError::Http`, reading the body for
/// the error message.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Http {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = ClientError::Http {
            status: 404,
            body: "no such block".to_string(),
        };
        assert!(err.is_not_found());

        let err = ClientError::Http {
            status: 500,
            body: String::new(),
        };
        assert!(!err.is_not_found());
        assert!(!ClientError::Transport("refused".to_string()).is_not_found());
    }

    #[test]
    fn test_display_clips_body() {
        let err = ClientError::Http {
            status: 503,
            body: "x".repeat(1000),
        };
        assert!(err.to_string().len() < 300);
    }
}
