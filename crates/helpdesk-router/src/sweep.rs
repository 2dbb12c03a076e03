//! Idle sweep: auto-close open tickets whose customer has gone quiet after
//! the last reply.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use helpdesk_core::lifecycle::auto_close;
use helpdesk_core::{AuthorKind, Channel, Message, Ticket, TicketId};
use helpdesk_store::{Changes, TicketFilter};
use tracing::{debug, info, warn};

use crate::{EngineError, RoutingEngine};

/// Whether `messages` show a ticket waiting on a customer whose last message
/// is no newer than `cutoff`.
fn is_idle(messages: &[Message], cutoff: DateTime<Utc>) -> bool {
    let Some(last) = messages.last() else {
        return false;
    };
    if last.author == AuthorKind::Customer {
        return false;
    }
    messages
        .iter()
        .rev()
        .find(|m| m.author == AuthorKind::Customer)
        .is_some_and(|m| m.created_at <= cutoff)
}

impl RoutingEngine {
    /// Close every open ticket on `channel` that has been idle for `idle`.
    ///
    /// Each ticket is its own unit of work and the idle condition is checked
    /// again inside it. A failing ticket is logged and skipped. Returns the
    /// ids that were closed.
    pub fn close_idle_tickets(
        &self,
        channel: Channel,
        idle: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<TicketId>, EngineError> {
        let Some(cutoff) = TimeDelta::from_std(idle)
            .ok()
            .and_then(|idle| now.checked_sub_signed(idle))
        else {
            return Ok(Vec::new());
        };
        let candidates = self.store.list_tickets(&TicketFilter {
            status: None,
            channel: Some(channel),
        })?;

        let mut closed = Vec::new();
        for candidate in candidates.iter().filter(|t| !t.status.is_terminal()) {
            let result = self.store.update_ticket(
                candidate.id,
                Box::new(|ticket: &mut Ticket, messages: &[Message]| {
                    if ticket.status.is_terminal() || !is_idle(messages, cutoff) {
                        return None;
                    }
                    auto_close(ticket, now);
                    Some(Changes::none())
                }),
            );
            match result {
                Ok(Some(ticket)) => closed.push(ticket.id),
                Ok(None) => debug!(ticket_id = candidate.id, "ticket not idle"),
                Err(err) => warn!(ticket_id = candidate.id, error = %err, "idle sweep skipped ticket"),
            }
        }

        info!(channel = %channel, closed = closed.len(), "idle sweep finished");
        Ok(closed)
    }
}
