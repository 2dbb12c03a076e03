//! Operator-side operations: overrides, confirmations, agent replies,
//! conversation summaries and read views.

use chrono::{DateTime, Utc};
use helpdesk_core::lifecycle::{apply_override, confirm_resolved};
use helpdesk_core::{
    AuthorKind, CallKind, Channel, Department, Message, NewMessage, NewModelRecord,
    StatusOverride, Ticket, TicketId, TicketTiming, ValidationError,
};
use helpdesk_store::{Changes, TicketFilter};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::payload;
use crate::{EngineError, RoutingEngine, transcript};

/// Stored agent reply plus the in-flight delivery, if one was started.
#[derive(Debug)]
pub struct AgentReply {
    pub ticket: Ticket,
    pub delivery: Option<JoinHandle<()>>,
}

/// Everything an operator sees for one ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketView {
    pub ticket: Ticket,
    pub department: Option<Department>,
    pub messages: Vec<Message>,
    pub timing: TicketTiming,
}

/// A ticket in a listing with its derived timing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub timing: TicketTiming,
}

impl RoutingEngine {
    /// Manual status change from the operator surface.
    pub fn override_status(
        &self,
        ticket_id: TicketId,
        change: &StatusOverride,
    ) -> Result<Ticket, EngineError> {
        let now = Utc::now();
        let ticket = self
            .store
            .update_ticket(
                ticket_id,
                Box::new(|ticket: &mut Ticket, _: &[Message]| {
                    apply_override(ticket, change, now);
                    Some(Changes::none())
                }),
            )?
            .ok_or(EngineError::NotFound(ticket_id))?;
        info!(ticket_id, status = %ticket.status, "status overridden");
        Ok(ticket)
    }

    /// The customer confirmed the automated answer solved the issue.
    pub fn confirm_resolved(&self, ticket_id: TicketId) -> Result<Ticket, EngineError> {
        let now = Utc::now();
        let ticket = self
            .store
            .update_ticket(
                ticket_id,
                Box::new(|ticket: &mut Ticket, _: &[Message]| {
                    confirm_resolved(ticket, now);
                    Some(Changes::none())
                }),
            )?
            .ok_or(EngineError::NotFound(ticket_id))?;
        info!(ticket_id, "resolution confirmed by customer");
        Ok(ticket)
    }

    /// Append an agent message and, for chat-bot tickets, push it to the
    /// customer in the background. Delivery failures are only logged; called
    /// outside a Tokio runtime, delivery is skipped.
    pub fn post_agent_reply(
        &self,
        ticket_id: TicketId,
        body: &str,
        language: Option<&str>,
    ) -> Result<AgentReply, EngineError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ValidationError::MissingField("body").into());
        }
        let now = Utc::now();
        let ticket = self
            .store
            .update_ticket(
                ticket_id,
                Box::new(|ticket: &mut Ticket, _: &[Message]| {
                    let language = language
                        .filter(|l| !l.trim().is_empty())
                        .unwrap_or(ticket.language.as_str())
                        .to_string();
                    ticket.updated_at = now;
                    Some(Changes::none().with_message(NewMessage::new(
                        AuthorKind::Agent,
                        body,
                        language,
                        now,
                    )))
                }),
            )?
            .ok_or(EngineError::NotFound(ticket_id))?;
        info!(ticket_id, "agent replied");

        let recipient = match (&self.delivery, ticket.channel, &ticket.customer.external_user_id) {
            (Some(delivery), Channel::ChatBot, Some(chat)) => Some((delivery.clone(), chat.clone())),
            _ => None,
        };
        let delivery = recipient.and_then(|(delivery, chat)| {
            let Ok(runtime) = Handle::try_current() else {
                warn!(ticket_id, "no async runtime, outbound delivery skipped");
                return None;
            };
            let text = body.to_string();
            Some(runtime.spawn(async move {
                if let Err(err) = delivery.deliver(&chat, &text).await {
                    warn!(ticket_id, error = %err, "outbound delivery failed");
                }
            }))
        });
        Ok(AgentReply { ticket, delivery })
    }

    /// Short model-written summary of the conversation, logged as a
    /// `summary` record.
    pub async fn summarize(&self, ticket_id: TicketId) -> Result<String, EngineError> {
        let (ticket, text) = self.conversation(ticket_id)?;
        let summary = self
            .bounded(self.responder.summarize(&text, &ticket.language))
            .await
            .map_err(EngineError::Generation)?;

        self.store.append_model_record(
            Some(ticket_id),
            NewModelRecord {
                model_name: self.responder.model_name().to_string(),
                kind: CallKind::Summary,
                request_payload: payload(&text),
                response_payload: payload(&summary),
                confidence: None,
                created_at: Utc::now(),
            },
        )?;
        Ok(summary)
    }

    /// Reply options for an agent, at most [`EngineConfig::max_suggestions`](crate::EngineConfig).
    pub async fn suggest_replies(&self, ticket_id: TicketId) -> Result<Vec<String>, EngineError> {
        let (ticket, text) = self.conversation(ticket_id)?;
        let max = self.config.max_suggestions;
        let mut suggestions = self
            .bounded(self.responder.suggest_replies(
                &text,
                &ticket.language,
                ticket.request_type.as_deref(),
                max,
            ))
            .await
            .map_err(EngineError::Generation)?;
        suggestions.truncate(max);
        Ok(suggestions)
    }

    /// Mark the latest classification of a ticket as wrong. Returns whether
    /// there was one to mark.
    pub fn flag_misclassified(&self, ticket_id: TicketId) -> Result<bool, EngineError> {
        self.require(ticket_id)?;
        let marked = self
            .store
            .mark_latest_corrected(ticket_id, CallKind::Classification)?;
        info!(ticket_id, marked, "classification flagged as corrected");
        Ok(marked)
    }

    pub fn view(&self, ticket_id: TicketId, now: DateTime<Utc>) -> Result<TicketView, EngineError> {
        let ticket = self.require(ticket_id)?;
        let department = match ticket.department_id {
            Some(id) => self.store.department(id)?,
            None => None,
        };
        let messages = self.store.messages(ticket_id)?;
        let timing = TicketTiming::compute(&ticket, now);
        Ok(TicketView {
            ticket,
            department,
            messages,
            timing,
        })
    }

    pub fn list(
        &self,
        filter: &TicketFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListedTicket>, EngineError> {
        Ok(self
            .store
            .list_tickets(filter)?
            .into_iter()
            .map(|ticket| {
                let timing = TicketTiming::compute(&ticket, now);
                ListedTicket { ticket, timing }
            })
            .collect())
    }

    fn require(&self, ticket_id: TicketId) -> Result<Ticket, EngineError> {
        self.store
            .ticket(ticket_id)?
            .ok_or(EngineError::NotFound(ticket_id))
    }

    fn conversation(&self, ticket_id: TicketId) -> Result<(Ticket, String), EngineError> {
        let ticket = self.require(ticket_id)?;
        let messages = self.store.messages(ticket_id)?;
        let text = transcript::render(&ticket, &messages);
        Ok((ticket, text))
    }
}
