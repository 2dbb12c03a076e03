//! Mail channel glue.
//!
//! Tickets are threaded through subjects tagged `[HD-<id>]`. A tagged mail
//! for an existing email ticket continues it; anything else opens a new
//! ticket. The caller owns IMAP/SMTP and sends whatever
//! [`handle_inbound_mail`] returns.
//!
//! Only automated answers are mailed back. A new mail that automation did
//! not answer gets no reply and no generated answer; it waits for an agent.

use std::sync::LazyLock;

use helpdesk_core::{Channel, CustomerIdentity, TicketId};
use helpdesk_router::{EngineError, Inbound, RoutingEngine};
use regex::Regex;
use tracing::{debug, info};

use crate::detect_language;

/// Subject used for mail that arrives without one.
pub const EMPTY_SUBJECT: &str = "(без темы)";

static TICKET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[HD-(\d+)\]").expect("ticket tag pattern"));

/// Reply to send back to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn ticket_tag(ticket_id: TicketId) -> String {
    format!("[HD-{ticket_id}]")
}

/// Ticket id from the first `[HD-<id>]` tag in `subject`.
pub fn parse_ticket_tag(subject: &str) -> Option<TicketId> {
    TICKET_TAG
        .captures(subject)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Subject for a reply: unchanged when already tagged, tag appended to an
/// existing `Re:` subject, `Re: <subject> <tag>` otherwise.
pub fn reply_subject(original: &str, ticket_id: TicketId) -> String {
    let tag = ticket_tag(ticket_id);
    if original.contains(&tag) {
        return original.to_string();
    }
    if original.to_lowercase().starts_with("re:") {
        return format!("{original} {tag}");
    }
    format!("Re: {original} {tag}").trim().to_string()
}

/// Route one inbound mail through the engine.
///
/// Mail from `own_address` is ignored. Returns the reply to send, present
/// only when automation answered.
pub async fn handle_inbound_mail(
    engine: &RoutingEngine,
    own_address: &str,
    from: &str,
    subject: &str,
    body: &str,
) -> Result<Option<OutgoingMail>, EngineError> {
    if !own_address.is_empty() && from.trim().eq_ignore_ascii_case(own_address.trim()) {
        debug!(from, "ignoring mail sent from our own mailbox");
        return Ok(None);
    }

    let body = body.trim();
    let language = detect_language(if body.is_empty() { subject } else { body }, "ru");

    if let Some(ticket_id) = parse_ticket_tag(subject) {
        let existing = engine.store().ticket(ticket_id)?;
        if existing.is_some_and(|t| t.channel == Channel::Email) {
            let text = if body.is_empty() { subject } else { body };
            let outcome = engine
                .continue_conversation(ticket_id, text, Some(language))
                .await?;
            info!(ticket_id, replied = outcome.reply.is_some(), "mail continued ticket");
            return Ok(outcome.reply.map(|reply| OutgoingMail {
                to: from.to_string(),
                subject: reply_subject(subject, ticket_id),
                body: reply,
            }));
        }
        debug!(ticket_id, "tag does not name an email ticket, opening a new one");
    }

    let subject = if subject.trim().is_empty() {
        EMPTY_SUBJECT
    } else {
        subject
    };
    let outcome = engine
        .create_from_inbound(Inbound {
            subject: subject.to_string(),
            description: body.to_string(),
            channel: Channel::Email,
            language: language.to_string(),
            customer: CustomerIdentity {
                email: Some(from.to_string()),
                ..CustomerIdentity::default()
            },
            request_type: None,
        })
        .await?;
    let ticket_id = outcome.ticket.id;
    info!(ticket_id, replied = outcome.reply.is_some(), "mail opened ticket");
    Ok(outcome.reply.map(|reply| OutgoingMail {
        to: from.to_string(),
        subject: reply_subject(subject, ticket_id),
        body: reply,
    }))
}
