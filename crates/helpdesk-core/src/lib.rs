pub mod classification;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod request_type;
pub mod sla;

pub use classification::{Classification, ClassificationOutcome, TV_CATEGORY};
pub use error::ValidationError;
pub use lifecycle::StatusOverride;
pub use model::{
    AuthorKind, CallKind, Channel, CustomerIdentity, Department, FaqEntry, Message, ModelRecord,
    NewFaqEntry, NewMessage, NewModelRecord, NewTicket, Priority, Ticket, TicketId, TicketStatus,
};
pub use request_type::RequestKind;
pub use sla::TicketTiming;
