//! Persistent entities: tickets, their messages, departments, FAQ entries,
//! and the audit log of model calls.
//!
//! Every enum carries a stable lowercase string code used by the stores and
//! the CLI. Parsing is strict: unknown codes are a [`ValidationError`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub type TicketId = i64;

// ── Enums ──

/// Medium through which a ticket originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Portal,
    ChatBot,
    Email,
    Phone,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portal => "portal",
            Self::ChatBot => "chat_bot",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portal" | "web" => Ok(Self::Portal),
            "chat_bot" | "chat" | "telegram" => Ok(Self::ChatBot),
            "email" | "mail" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            _ => Err(ValidationError::UnknownChannel(s.to_string())),
        }
    }
}

/// Ticket priority. P1 is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::P1, Self::P2, Self::P3, Self::P4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
        }
    }

    /// Minutes allowed before an open ticket breaches its SLA.
    pub fn sla_target_minutes(&self) -> u32 {
        match self {
            Self::P1 => 30,
            Self::P2 => 60,
            Self::P3 => 240,
            Self::P4 => 1440,
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            "P4" => Ok(Self::P4),
            _ => Err(ValidationError::UnknownPriority(s.to_string())),
        }
    }
}

/// Ticket lifecycle state. `Closed` and `AutoClosed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    Closed,
    AutoClosed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [Self::New, Self::InProgress, Self::Closed, Self::AutoClosed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
            Self::AutoClosed => "auto_closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::AutoClosed)
    }
}

impl FromStr for TicketStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            "auto_closed" => Ok(Self::AutoClosed),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorKind {
    Customer,
    Agent,
    Automation,
}

impl AuthorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Agent => "agent",
            Self::Automation => "automation",
        }
    }
}

impl FromStr for AuthorKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "customer" => Ok(Self::Customer),
            "agent" => Ok(Self::Agent),
            "automation" | "ai" => Ok(Self::Automation),
            _ => Err(ValidationError::UnknownAuthor(s.to_string())),
        }
    }
}

/// Kind of external model call recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Classification,
    Answer,
    Summary,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Answer => "answer",
            Self::Summary => "summary",
        }
    }
}

impl FromStr for CallKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "classification" => Ok(Self::Classification),
            "answer" => Ok(Self::Answer),
            "summary" => Ok(Self::Summary),
            _ => Err(ValidationError::UnknownCallKind(s.to_string())),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Channel, Priority, TicketStatus, AuthorKind, CallKind);

// ── Entities ──

/// Channel-dependent customer identity. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub email: Option<String>,
    pub username: Option<String>,
    /// Chat user id or upstream message id, depending on the channel.
    pub external_user_id: Option<String>,
}

/// One customer case.
///
/// `closed_at` is set exactly when `status` is terminal. `category_code` is
/// `None` only before the first classification, and `department_id` only on
/// a chat-bot placeholder awaiting its first message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub subject: String,
    /// Latest inbound text only. The message log is the transcript.
    pub description: String,
    pub channel: Channel,
    pub language: String,
    pub customer: CustomerIdentity,
    /// Free-form hint, normally one of the [`RequestKind`](crate::RequestKind) codes.
    pub request_type: Option<String>,
    pub category_code: Option<String>,
    pub priority: Priority,
    pub status: TicketStatus,
    pub department_id: Option<i64>,
    pub auto_closed_by_automation: bool,
    pub automation_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A ticket before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub channel: Channel,
    pub language: String,
    pub customer: CustomerIdentity,
    pub request_type: Option<String>,
    pub category_code: Option<String>,
    pub priority: Priority,
    pub status: TicketStatus,
    pub department_id: Option<i64>,
    pub auto_closed_by_automation: bool,
    pub automation_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl NewTicket {
    /// Attach the store-assigned id.
    pub fn into_ticket(self, id: TicketId) -> Ticket {
        Ticket {
            id,
            subject: self.subject,
            description: self.description,
            channel: self.channel,
            language: self.language,
            customer: self.customer,
            request_type: self.request_type,
            category_code: self.category_code,
            priority: self.priority,
            status: self.status,
            department_id: self.department_id,
            auto_closed_by_automation: self.auto_closed_by_automation,
            automation_disabled: self.automation_disabled,
            created_at: self.created_at,
            updated_at: self.created_at,
            status_updated_at: self.status_updated_at,
            closed_at: self.closed_at,
        }
    }
}

/// One turn of a ticket's conversation. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub ticket_id: TicketId,
    pub author: AuthorKind,
    pub body: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// A message to append within a ticket's unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub author: AuthorKind,
    pub body: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(
        author: AuthorKind,
        body: impl Into<String>,
        language: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            author,
            body: body.into(),
            language: language.into(),
            created_at,
        }
    }
}

/// Routing target. Created lazily with `name == code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Operator-curated canned answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub language: String,
    pub category_code: Option<String>,
    pub auto_resolvable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFaqEntry {
    pub question: String,
    pub answer: String,
    pub language: String,
    pub category_code: Option<String>,
    pub auto_resolvable: bool,
}

/// Audit row for one classification/generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: i64,
    pub ticket_id: Option<TicketId>,
    pub model_name: String,
    pub kind: CallKind,
    pub request_payload: String,
    pub response_payload: String,
    pub confidence: Option<f64>,
    pub was_corrected: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewModelRecord {
    pub model_name: String,
    pub kind: CallKind,
    pub request_payload: String,
    pub response_payload: String,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}
