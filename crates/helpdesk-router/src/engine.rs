//! The routing engine: classification, department resolution, first-contact
//! auto-resolution and conversation continuation.
//!
//! Model calls run first, bounded by [`EngineConfig::call_timeout`]; only then
//! is the ticket written, as one unit of work through the store. No lock is
//! held while waiting on a model.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use helpdesk_ai::{AiError, Classify, Gateways, Respond};
use helpdesk_core::lifecycle::begin_progress;
use helpdesk_core::{
    AuthorKind, CallKind, Channel, ClassificationOutcome, CustomerIdentity, Message, NewMessage,
    NewModelRecord, NewTicket, Priority, Ticket, TicketId, TicketStatus, ValidationError,
};
use helpdesk_store::{Changes, TicketStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::faq::FaqMatcher;
use crate::{Deliver, EngineConfig, EngineError};

/// A first contact from any channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub subject: String,
    pub description: String,
    pub channel: Channel,
    /// Caller's guess, used when the classifier returns no language.
    pub language: String,
    pub customer: CustomerIdentity,
    pub request_type: Option<String>,
}

/// A ticket whose triage was already done upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTicket {
    pub subject: String,
    pub description: String,
    pub channel: Channel,
    pub language: String,
    pub customer: CustomerIdentity,
    pub request_type: Option<String>,
    pub category_code: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub department_code: String,
}

/// An empty chat-bot ticket opened from the request-type menu.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub subject: String,
    pub chat_user_id: String,
    pub username: Option<String>,
    pub language: String,
    pub request_type: Option<String>,
}

/// Result of an inbound operation: the stored ticket and the automation
/// reply the channel should deliver, if one was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub ticket: Ticket,
    pub reply: Option<String>,
}

/// Automated answer obtained before the ticket unit is written.
struct Resolution {
    text: String,
    language: String,
    record: Option<NewModelRecord>,
}

pub struct RoutingEngine {
    pub(crate) store: Arc<dyn TicketStore>,
    pub(crate) classifier: Arc<dyn Classify>,
    pub(crate) responder: Arc<dyn Respond>,
    pub(crate) delivery: Option<Arc<dyn Deliver>>,
    pub(crate) config: EngineConfig,
}

impl RoutingEngine {
    pub fn new(store: Arc<dyn TicketStore>, gateways: Gateways, config: EngineConfig) -> Self {
        Self {
            store,
            classifier: gateways.classifier,
            responder: gateways.responder,
            delivery: None,
            config,
        }
    }

    /// Attach an outbound channel for agent replies.
    pub fn with_delivery(mut self, delivery: Arc<dyn Deliver>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Inbound ──

    /// Classify, route and persist a first contact, auto-closing it when a
    /// confident automated answer is available.
    pub async fn create_from_inbound(&self, inbound: Inbound) -> Result<Outcome, EngineError> {
        if inbound.subject.trim().is_empty() && inbound.description.trim().is_empty() {
            return Err(ValidationError::MissingField("description").into());
        }

        let text = combined(&inbound.subject, &inbound.description);
        let (outcome, record) = self.classify(&text, inbound.request_type.as_deref()).await?;
        let result = &outcome.effective;
        let department = self.store.get_or_create_department(&result.department_code)?;
        let language = first_filled(&[result.language.as_str(), inbound.language.as_str()]).unwrap_or("ru");

        let resolution = if result.qualifies_for_auto_resolution(self.config.confidence_threshold) {
            self.resolve(
                &result.category_code,
                language,
                &text,
                inbound.request_type.as_deref(),
            )
            .await
        } else {
            None
        };

        let now = Utc::now();
        let mut messages = vec![NewMessage::new(
            AuthorKind::Customer,
            inbound.description.as_str(),
            inbound.language.as_str(),
            now,
        )];
        let mut records = vec![record];
        let mut draft = NewTicket {
            subject: inbound.subject,
            description: inbound.description,
            channel: inbound.channel,
            language: language.to_string(),
            customer: inbound.customer,
            request_type: inbound.request_type,
            category_code: Some(result.category_code.clone()),
            priority: result.priority,
            status: TicketStatus::New,
            department_id: Some(department.id),
            auto_closed_by_automation: false,
            automation_disabled: false,
            created_at: now,
            status_updated_at: now,
            closed_at: None,
        };

        let reply = match resolution {
            Some(resolution) => {
                draft.status = TicketStatus::AutoClosed;
                draft.auto_closed_by_automation = true;
                draft.closed_at = Some(now);
                messages.push(NewMessage::new(
                    AuthorKind::Automation,
                    resolution.text.as_str(),
                    resolution.language,
                    now,
                ));
                records.extend(resolution.record);
                Some(resolution.text)
            }
            None => None,
        };

        let ticket = self.store.insert_ticket(draft, messages, records)?;
        info!(
            ticket_id = ticket.id,
            channel = %ticket.channel,
            category = %result.category_code,
            department = %department.code,
            confidence = result.confidence,
            status = %ticket.status,
            "ticket created"
        );
        Ok(Outcome { ticket, reply })
    }

    /// Apply a customer follow-up to an existing ticket.
    ///
    /// Re-classifies, moves the ticket to IN_PROGRESS and, unless automation
    /// is disabled for the ticket, appends an automated reply. Never closes.
    pub async fn continue_conversation(
        &self,
        ticket_id: TicketId,
        text: &str,
        language: Option<&str>,
    ) -> Result<Outcome, EngineError> {
        if text.trim().is_empty() {
            return Err(ValidationError::MissingField("message").into());
        }
        let snapshot = self
            .store
            .ticket(ticket_id)?
            .ok_or(EngineError::NotFound(ticket_id))?;

        let context = combined(&snapshot.subject, text);
        let request_type = snapshot.request_type.as_deref();
        let (outcome, record) = self.classify(&context, request_type).await?;
        let result = outcome.effective;
        let department = self.store.get_or_create_department(&result.department_code)?;
        let language = first_filled(&[
            language.unwrap_or_default(),
            result.language.as_str(),
            snapshot.language.as_str(),
        ])
        .unwrap_or("ru")
        .to_string();

        let resolution = if !snapshot.automation_disabled
            && result.qualifies_for_auto_resolution(self.config.confidence_threshold)
        {
            self.resolve(&result.category_code, &language, &context, request_type)
                .await
        } else {
            None
        };

        let now = Utc::now();
        let mut reply = None;
        let reply_slot = &mut reply;
        let updated = self.store.update_ticket(
            ticket_id,
            Box::new(move |ticket: &mut Ticket, _: &[Message]| {
                ticket.description = text.to_string();
                ticket.language = language.clone();
                ticket.category_code = Some(result.category_code);
                ticket.priority = result.priority;
                ticket.department_id = Some(department.id);
                begin_progress(ticket, now);

                let mut changes = Changes::none()
                    .with_message(NewMessage::new(AuthorKind::Customer, text, language, now))
                    .with_record(record);
                // The flag may have been set while the model was answering.
                if let Some(resolution) = resolution
                    && !ticket.automation_disabled
                {
                    changes = changes.with_message(NewMessage::new(
                        AuthorKind::Automation,
                        resolution.text.as_str(),
                        resolution.language,
                        now,
                    ));
                    changes.records.extend(resolution.record);
                    *reply_slot = Some(resolution.text);
                }
                Some(changes)
            }),
        )?;
        let ticket = updated.ok_or(EngineError::NotFound(ticket_id))?;

        info!(
            ticket_id,
            status = %ticket.status,
            replied = reply.is_some(),
            "conversation continued"
        );
        Ok(Outcome { ticket, reply })
    }

    /// Persist a ticket with upstream-supplied triage. No classification.
    pub fn create_from_external(&self, external: ExternalTicket) -> Result<Ticket, EngineError> {
        if external.category_code.trim().is_empty() {
            return Err(ValidationError::MissingField("category_code").into());
        }
        if external.department_code.trim().is_empty() {
            return Err(ValidationError::MissingField("department_code").into());
        }
        let department = self
            .store
            .get_or_create_department(external.department_code.trim())?;

        let now = Utc::now();
        let message = NewMessage::new(
            AuthorKind::Customer,
            external.description.as_str(),
            external.language.as_str(),
            now,
        );
        let draft = NewTicket {
            subject: external.subject,
            description: external.description,
            channel: external.channel,
            language: external.language,
            customer: external.customer,
            request_type: external.request_type,
            category_code: Some(external.category_code),
            priority: external.priority,
            status: external.status,
            department_id: Some(department.id),
            auto_closed_by_automation: external.status == TicketStatus::AutoClosed,
            automation_disabled: false,
            created_at: now,
            status_updated_at: now,
            closed_at: external.status.is_terminal().then_some(now),
        };
        let ticket = self.store.insert_ticket(draft, vec![message], Vec::new())?;
        info!(ticket_id = ticket.id, status = %ticket.status, "external ticket created");
        Ok(ticket)
    }

    /// Open an empty chat-bot ticket. The first real message arrives through
    /// [`continue_conversation`](Self::continue_conversation).
    pub fn create_placeholder(&self, placeholder: Placeholder) -> Result<Ticket, EngineError> {
        let now = Utc::now();
        let draft = NewTicket {
            subject: placeholder.subject,
            description: String::new(),
            channel: Channel::ChatBot,
            language: placeholder.language,
            customer: CustomerIdentity {
                email: None,
                username: placeholder.username,
                external_user_id: Some(placeholder.chat_user_id),
            },
            request_type: placeholder.request_type,
            category_code: None,
            priority: Priority::P3,
            status: TicketStatus::New,
            department_id: None,
            auto_closed_by_automation: false,
            automation_disabled: false,
            created_at: now,
            status_updated_at: now,
            closed_at: None,
        };
        let ticket = self.store.insert_ticket(draft, Vec::new(), Vec::new())?;
        debug!(ticket_id = ticket.id, "placeholder ticket opened");
        Ok(ticket)
    }

    // ── Model calls ──

    pub(crate) async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, AiError>>,
    ) -> Result<T, AiError> {
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout(self.config.call_timeout)),
        }
    }

    /// Classify `text` and apply the keyword correction. Returns the audit
    /// record to write with the ticket.
    async fn classify(
        &self,
        text: &str,
        request_type: Option<&str>,
    ) -> Result<(ClassificationOutcome, NewModelRecord), EngineError> {
        let raw = self
            .bounded(self.classifier.classify(text, request_type))
            .await
            .and_then(|c| c.validate().map_err(AiError::from))
            .map_err(|err| {
                warn!(error = %err, "classification failed");
                EngineError::Classification(err)
            })?;

        let outcome = ClassificationOutcome::correct(raw, text);
        if outcome.overridden() {
            debug!(
                from = %outcome.raw.category_code,
                to = %outcome.effective.category_code,
                "keyword override applied"
            );
        }

        let record = NewModelRecord {
            model_name: self.classifier.model_name().to_string(),
            kind: CallKind::Classification,
            request_payload: payload(&ClassifyRequest { text, request_type }),
            response_payload: payload(&outcome),
            confidence: Some(outcome.effective.confidence),
            created_at: Utc::now(),
        };
        Ok((outcome, record))
    }

    /// Best-effort automated answer: FAQ first, generator second. Failures
    /// are logged and yield `None`.
    async fn resolve(
        &self,
        category: &str,
        language: &str,
        context: &str,
        request_type: Option<&str>,
    ) -> Option<Resolution> {
        let matcher = FaqMatcher::new(self.store.as_ref());
        match matcher.find_best_match(Some(category), language, request_type) {
            Ok(Some(entry)) => {
                debug!(faq_id = entry.id, category, "answered from FAQ");
                return Some(Resolution {
                    text: entry.answer,
                    language: entry.language,
                    record: None,
                });
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, category, "FAQ lookup failed, skipping automated answer");
                return None;
            }
        }

        let answer = match self
            .bounded(self.responder.generate(context, language, request_type))
            .await
        {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, category, "answer generation failed, leaving ticket for an agent");
                return None;
            }
        };
        let record = NewModelRecord {
            model_name: self.responder.model_name().to_string(),
            kind: CallKind::Answer,
            request_payload: payload(&GenerateRequest {
                context,
                language,
                request_type,
            }),
            response_payload: payload(&answer),
            confidence: None,
            created_at: Utc::now(),
        };
        Some(Resolution {
            text: answer.text,
            language: answer.language,
            record: Some(record),
        })
    }
}

// ── Helpers ──

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
    request_type: Option<&'a str>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    context: &'a str,
    language: &'a str,
    request_type: Option<&'a str>,
}

pub(crate) fn payload<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn combined(subject: &str, body: &str) -> String {
    format!("{}\n\n{}", subject.trim(), body.trim())
}

fn first_filled<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
}
