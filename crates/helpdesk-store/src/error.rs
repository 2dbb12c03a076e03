use helpdesk_core::{TicketId, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket {0} not found")]
    TicketNotFound(TicketId),

    #[error("FAQ entry {0} not found")]
    FaqNotFound(i64),

    #[error("department {0} not found")]
    DepartmentNotFound(String),

    #[error("ticket {id} would break an invariant: {reason}")]
    Inconsistent { id: TicketId, reason: String },

    #[error("invalid stored value: {0}")]
    InvalidValue(#[from] ValidationError),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),
}
