use helpdesk_ai::AiError;
use helpdesk_core::{TicketId, ValidationError};
use helpdesk_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed, unreachable or timed-out classifier. Nothing was written.
    #[error("classification failed: {0}")]
    Classification(#[source] AiError),

    #[error("generation failed: {0}")]
    Generation(#[source] AiError),

    #[error("ticket {0} not found")]
    NotFound(TicketId),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TicketNotFound(id) => Self::NotFound(id),
            StoreError::InvalidValue(v) => Self::Validation(v),
            other => Self::Store(other),
        }
    }
}

/// Outbound channel delivery failure. Logged, never propagated to callers.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("channel rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}
