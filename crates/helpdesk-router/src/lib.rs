//! Ticket routing engine.
//!
//! [`RoutingEngine`] ties the store and the model gateways together: it
//! classifies inbound contacts, routes them to a department, auto-resolves
//! confident first contacts from the FAQ or the answer generator, and
//! exposes the operator-side operations, analytics and the idle sweep.

pub mod analytics;
mod config;
mod deliver;
mod engine;
mod error;
mod faq;
mod ops;
mod sweep;
pub mod transcript;

#[cfg(test)]
mod testing;

pub use analytics::Overview;
pub use config::EngineConfig;
pub use deliver::Deliver;
pub use engine::{ExternalTicket, Inbound, Outcome, Placeholder, RoutingEngine};
pub use error::{DeliveryError, EngineError};
pub use faq::FaqMatcher;
pub use ops::{AgentReply, ListedTicket, TicketView};
