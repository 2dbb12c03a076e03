//! The storage contract shared by every backend.
//!
//! Mutating a ticket is always one unit of work: field changes, appended
//! messages and audit records are committed together or not at all. Callers
//! do their slow work (model calls) first and hand the store a [`Mutation`]
//! that runs against the freshest ticket inside the store's transaction.

use std::collections::HashSet;

use helpdesk_core::lifecycle::closed_at_consistent;
use helpdesk_core::{
    AuthorKind, CallKind, Channel, Department, FaqEntry, Message, ModelRecord, NewFaqEntry,
    NewMessage, NewModelRecord, NewTicket, Ticket, TicketId, TicketStatus,
};

use crate::StoreError;

/// Rows to append alongside a ticket update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    pub messages: Vec<NewMessage>,
    pub records: Vec<NewModelRecord>,
}

impl Changes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: NewMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_record(mut self, record: NewModelRecord) -> Self {
        self.records.push(record);
        self
    }
}

/// In-transaction edit of one ticket.
///
/// Receives the current ticket and its ordered transcript. Returning `None`
/// abandons the unit without writing anything.
pub type Mutation<'a> = Box<dyn FnOnce(&mut Ticket, &[Message]) -> Option<Changes> + Send + 'a>;

/// Optional filters for [`TicketStore::list_tickets`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub channel: Option<Channel>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.is_none_or(|s| s == ticket.status)
            && self.channel.is_none_or(|c| c == ticket.channel)
    }
}

/// Counts over classification-kind audit records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationStats {
    pub total: u64,
    pub corrected: u64,
}

pub trait TicketStore: Send + Sync {
    // ── Departments ──

    /// Fetch the department with `code`, creating it (name = code) on first use.
    fn get_or_create_department(&self, code: &str) -> Result<Department, StoreError>;

    fn department(&self, id: i64) -> Result<Option<Department>, StoreError>;

    fn rename_department(&self, code: &str, name: &str) -> Result<Department, StoreError>;

    // ── Tickets ──

    /// Persist a new ticket with its first messages and audit records.
    fn insert_ticket(
        &self,
        draft: NewTicket,
        messages: Vec<NewMessage>,
        records: Vec<NewModelRecord>,
    ) -> Result<Ticket, StoreError>;

    /// Apply `mutation` to ticket `id` atomically.
    ///
    /// Returns `Ok(None)` when the mutation declined to change anything and
    /// [`StoreError::TicketNotFound`] when the ticket does not exist.
    fn update_ticket(&self, id: TicketId, mutation: Mutation<'_>)
    -> Result<Option<Ticket>, StoreError>;

    fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;

    /// Tickets matching `filter`, newest first.
    fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError>;

    /// Transcript of a ticket ordered by creation time.
    fn messages(&self, ticket_id: TicketId) -> Result<Vec<Message>, StoreError>;

    /// Ids of tickets with at least one message by `author`.
    fn ticket_ids_with_author(&self, author: AuthorKind) -> Result<HashSet<TicketId>, StoreError>;

    // ── Model-call audit log ──

    fn append_model_record(
        &self,
        ticket_id: Option<TicketId>,
        record: NewModelRecord,
    ) -> Result<ModelRecord, StoreError>;

    fn model_records(&self, ticket_id: TicketId) -> Result<Vec<ModelRecord>, StoreError>;

    /// Flag the most recent record of `kind` for a ticket as corrected.
    /// Returns whether a record was found.
    fn mark_latest_corrected(&self, ticket_id: TicketId, kind: CallKind) -> Result<bool, StoreError>;

    fn classification_stats(&self) -> Result<ClassificationStats, StoreError>;

    // ── FAQ ──

    fn add_faq(&self, entry: NewFaqEntry) -> Result<FaqEntry, StoreError>;

    /// Entries (optionally in one language), most recently added first.
    fn list_faq(&self, language: Option<&str>) -> Result<Vec<FaqEntry>, StoreError>;

    fn delete_faq(&self, id: i64) -> Result<(), StoreError>;
}

/// Reject a ticket state that breaks the `closed_at` invariant.
pub(crate) fn check_ticket(ticket: &Ticket) -> Result<(), StoreError> {
    if !closed_at_consistent(ticket) {
        return Err(StoreError::Inconsistent {
            id: ticket.id,
            reason: format!(
                "status {} with closed_at {:?}",
                ticket.status, ticket.closed_at
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_builder_accumulates() {
        let now = chrono::Utc::now();
        let changes = Changes::none()
            .with_message(NewMessage::new(AuthorKind::Customer, "hi", "ru", now))
            .with_message(NewMessage::new(AuthorKind::Automation, "hello", "ru", now));
        assert_eq!(changes.messages.len(), 2);
        assert!(changes.records.is_empty());
    }
}
