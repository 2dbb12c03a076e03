//! Stub gateways and fixtures shared by the engine tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use helpdesk_ai::{AiError, Answer, Classify, Gateways, Respond};
use helpdesk_core::{
    AuthorKind, CallKind, Channel, Classification, CustomerIdentity, Department, FaqEntry,
    Message, ModelRecord, NewFaqEntry, NewMessage, NewModelRecord, NewTicket, Priority, Ticket,
    TicketId, TicketStatus,
};
use helpdesk_store::{
    ClassificationStats, MemoryStore, Mutation, StoreError, TicketFilter, TicketStore,
};

use crate::{Deliver, DeliveryError, EngineConfig, RoutingEngine};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub(crate) fn sample_ticket() -> Ticket {
    Ticket {
        id: 1,
        subject: "Нет связи".into(),
        description: "Не работает интернет".into(),
        channel: Channel::Portal,
        language: "ru".into(),
        customer: CustomerIdentity::default(),
        request_type: Some("problem".into()),
        category_code: Some("INTERNET_HOME".into()),
        priority: Priority::P2,
        status: TicketStatus::New,
        department_id: Some(1),
        auto_closed_by_automation: false,
        automation_disabled: false,
        created_at: t0(),
        updated_at: t0(),
        status_updated_at: t0(),
        closed_at: None,
    }
}

pub(crate) fn internet(confidence: f64) -> Classification {
    Classification {
        category_code: "INTERNET_HOME".into(),
        department_code: "technical_support".into(),
        priority: Priority::P2,
        language: "ru".into(),
        auto_resolvable: true,
        confidence,
    }
}

// ── Classifier ──

#[derive(Clone)]
enum Behavior {
    Return(Classification),
    Fail,
    Hang,
}

#[derive(Clone)]
pub(crate) struct StubClassifier {
    behavior: Arc<Mutex<Behavior>>,
    calls: Arc<AtomicUsize>,
}

impl StubClassifier {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn returning(result: Classification) -> Self {
        Self::with(Behavior::Return(result))
    }

    pub(crate) fn failing() -> Self {
        Self::with(Behavior::Fail)
    }

    pub(crate) fn hanging() -> Self {
        Self::with(Behavior::Hang)
    }

    pub(crate) fn respond_with(&self, result: Classification) {
        *self.behavior.lock().unwrap() = Behavior::Return(result);
    }

    pub(crate) fn fail(&self) {
        *self.behavior.lock().unwrap() = Behavior::Fail;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classify for StubClassifier {
    fn model_name(&self) -> &str {
        "stub-classifier"
    }

    async fn classify(
        &self,
        _text: &str,
        _request_type: Option<&str>,
    ) -> Result<Classification, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Return(result) => Ok(result),
            Behavior::Fail => Err(AiError::Protocol("not JSON".into())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(AiError::Protocol("unreachable".into()))
            }
        }
    }
}

// ── Responder ──

#[derive(Clone)]
pub(crate) struct StubResponder {
    answer: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StubResponder {
    pub(crate) fn answering(text: &str) -> Self {
        Self {
            answer: Some(text.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            answer: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reply(&self) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .clone()
            .ok_or_else(|| AiError::Server {
                status: 503,
                body: "unavailable".into(),
            })
    }
}

#[async_trait]
impl Respond for StubResponder {
    fn model_name(&self) -> &str {
        "stub-responder"
    }

    async fn generate(
        &self,
        _context: &str,
        language: &str,
        _request_type: Option<&str>,
    ) -> Result<Answer, AiError> {
        Ok(Answer {
            text: self.reply()?,
            language: language.to_string(),
        })
    }

    async fn summarize(&self, _transcript: &str, _language: &str) -> Result<String, AiError> {
        self.reply()
    }

    async fn suggest_replies(
        &self,
        _transcript: &str,
        _language: &str,
        _request_type: Option<&str>,
        max: usize,
    ) -> Result<Vec<String>, AiError> {
        let text = self.reply()?;
        Ok(std::iter::repeat_n(text, max).collect())
    }
}

// ── Delivery ──

#[derive(Clone, Default)]
pub(crate) struct RecordingDelivery {
    pub(crate) sent: Arc<Mutex<Vec<(String, String)>>>,
    pub(crate) fail: bool,
}

#[async_trait]
impl Deliver for RecordingDelivery {
    async fn deliver(&self, recipient: &str, text: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Transport("connection refused".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}

// ── Store ──

/// Memory store whose FAQ table is unreachable.
pub(crate) struct FaqOutage(pub(crate) MemoryStore);

impl TicketStore for FaqOutage {
    fn get_or_create_department(&self, code: &str) -> Result<Department, StoreError> {
        self.0.get_or_create_department(code)
    }

    fn department(&self, id: i64) -> Result<Option<Department>, StoreError> {
        self.0.department(id)
    }

    fn rename_department(&self, code: &str, name: &str) -> Result<Department, StoreError> {
        self.0.rename_department(code, name)
    }

    fn insert_ticket(
        &self,
        draft: NewTicket,
        messages: Vec<NewMessage>,
        records: Vec<NewModelRecord>,
    ) -> Result<Ticket, StoreError> {
        self.0.insert_ticket(draft, messages, records)
    }

    fn update_ticket(
        &self,
        id: TicketId,
        mutation: Mutation<'_>,
    ) -> Result<Option<Ticket>, StoreError> {
        self.0.update_ticket(id, mutation)
    }

    fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        self.0.ticket(id)
    }

    fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        self.0.list_tickets(filter)
    }

    fn messages(&self, ticket_id: TicketId) -> Result<Vec<Message>, StoreError> {
        self.0.messages(ticket_id)
    }

    fn ticket_ids_with_author(
        &self,
        author: AuthorKind,
    ) -> Result<HashSet<TicketId>, StoreError> {
        self.0.ticket_ids_with_author(author)
    }

    fn append_model_record(
        &self,
        ticket_id: Option<TicketId>,
        record: NewModelRecord,
    ) -> Result<ModelRecord, StoreError> {
        self.0.append_model_record(ticket_id, record)
    }

    fn model_records(&self, ticket_id: TicketId) -> Result<Vec<ModelRecord>, StoreError> {
        self.0.model_records(ticket_id)
    }

    fn mark_latest_corrected(&self, ticket_id: TicketId, kind: CallKind) -> Result<bool, StoreError> {
        self.0.mark_latest_corrected(ticket_id, kind)
    }

    fn classification_stats(&self) -> Result<ClassificationStats, StoreError> {
        self.0.classification_stats()
    }

    fn add_faq(&self, entry: NewFaqEntry) -> Result<FaqEntry, StoreError> {
        self.0.add_faq(entry)
    }

    fn list_faq(&self, _language: Option<&str>) -> Result<Vec<FaqEntry>, StoreError> {
        Err(StoreError::Corrupt("faq table unreadable".into()))
    }

    fn delete_faq(&self, id: i64) -> Result<(), StoreError> {
        self.0.delete_faq(id)
    }
}

// ── Engine ──

pub(crate) fn engine_over(
    store: Arc<dyn TicketStore>,
    classifier: StubClassifier,
    responder: StubResponder,
) -> RoutingEngine {
    let gateways = Gateways {
        classifier: Arc::new(classifier),
        responder: Arc::new(responder),
    };
    RoutingEngine::new(store, gateways, EngineConfig::default())
}

pub(crate) fn engine_with_config(
    classifier: StubClassifier,
    responder: StubResponder,
    config: EngineConfig,
) -> (RoutingEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let gateways = Gateways {
        classifier: Arc::new(classifier),
        responder: Arc::new(responder),
    };
    (RoutingEngine::new(store.clone(), gateways, config), store)
}

pub(crate) fn engine_with(
    classifier: StubClassifier,
    responder: StubResponder,
) -> (RoutingEngine, Arc<MemoryStore>) {
    engine_with_config(classifier, responder, EngineConfig::default())
}
