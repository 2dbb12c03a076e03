//! Storage layer: the `TicketStore` unit-of-work contract, an in-memory
//! backend, and a DuckDB backend for persistent deployments.

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{Changes, ClassificationStats, Mutation, TicketFilter, TicketStore};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
