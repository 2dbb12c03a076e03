use thiserror::Error;

/// Rejected input. Raised before any state change.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unsupported ticket status: {0}")]
    UnknownStatus(String),

    #[error("unsupported priority: {0} (expected P1-P4)")]
    UnknownPriority(String),

    #[error("unsupported channel: {0}")]
    UnknownChannel(String),

    #[error("unsupported author kind: {0}")]
    UnknownAuthor(String),

    #[error("unsupported model call kind: {0}")]
    UnknownCallKind(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}
