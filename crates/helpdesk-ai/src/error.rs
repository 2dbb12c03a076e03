use std::time::Duration;

use helpdesk_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Protocol(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid classification: {0}")]
    Invalid(#[from] ValidationError),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
}
