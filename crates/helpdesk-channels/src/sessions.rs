//! Chat-bot conversation state.
//!
//! A chat picks a request type from [`REQUEST_MENU`], which opens a
//! placeholder ticket; every text that follows continues that ticket. The
//! state lives only in memory and is dropped when the customer confirms the
//! answer helped.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use helpdesk_core::{Channel, CustomerIdentity, Ticket, TicketId};
use helpdesk_router::{EngineError, Inbound, Placeholder, RoutingEngine};
use tracing::{debug, info};

use crate::detect_language;

/// Request types offered to a new chat, with their button labels.
pub const REQUEST_MENU: [(&str, &str); 6] = [
    ("problem", "Что-то не работает"),
    ("question", "У меня есть вопрос"),
    ("feedback", "Предложение или отзыв"),
    ("career", "Работа и стажировки"),
    ("partner", "Партнёрство и сотрудничество"),
    ("other", "Другое"),
];

const DEFAULT_SUBJECT: &str = "Обращение";

/// Ticket subject for a menu key.
pub fn menu_label(request_type: &str) -> &'static str {
    REQUEST_MENU
        .iter()
        .find(|(key, _)| *key == request_type)
        .map(|(_, label)| *label)
        .unwrap_or(DEFAULT_SUBJECT)
}

/// Two-letter UI language from a client language code such as `en-US`.
pub fn ui_language(language_code: Option<&str>) -> String {
    match language_code.map(str::trim) {
        Some(code) if !code.is_empty() => code.chars().take(2).collect(),
        _ => "ru".to_string(),
    }
}

/// Prefix an automated answer with a personal greeting.
pub fn with_greeting(first_name: Option<&str>, answer: &str) -> String {
    match first_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!(
            "{name}, ваш запрос обработан. Мы предлагаем вам следующее решение:\n\n{answer}"
        ),
        None => format!("Ваш запрос обработан. Мы предлагаем вам следующее решение:\n\n{answer}"),
    }
}

/// Shown while the engine is working on a message.
pub fn processing_notice(language: &str) -> &'static str {
    if language.starts_with("kk") {
        "Сұрауыңыз өңделуде, 5–30 секунд күтіңіз."
    } else {
        "Запрос в обработке...\n\nПожалуйста подождите 5–30 секунд."
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub request_type: String,
    pub language: String,
    pub ticket_id: TicketId,
}

/// What the bot should tell the chat after a text message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// No request type picked yet.
    ChooseRequestType,
    /// Automation answered; ask whether it helped.
    Answered { ticket: Ticket, text: String },
    /// Left for an agent.
    Forwarded { ticket: Ticket },
}

#[derive(Debug, Default)]
pub struct ChatSessions {
    sessions: Mutex<HashMap<String, ChatSession>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: &str) -> Option<ChatSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(chat_id)
            .cloned()
    }

    fn put(&self, chat_id: &str, session: ChatSession) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat_id.to_string(), session);
    }

    pub fn end(&self, chat_id: &str) -> Option<ChatSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(chat_id)
    }

    /// A menu choice: open a placeholder ticket and remember it for the chat.
    pub fn choose_request_type(
        &self,
        engine: &RoutingEngine,
        chat_id: &str,
        request_type: &str,
        username: Option<&str>,
        language_code: Option<&str>,
    ) -> Result<Ticket, EngineError> {
        let language = ui_language(language_code);
        let ticket = engine.create_placeholder(Placeholder {
            subject: menu_label(request_type).to_string(),
            chat_user_id: chat_id.to_string(),
            username: username.map(str::to_string),
            language: language.clone(),
            request_type: Some(request_type.to_string()),
        })?;
        self.put(
            chat_id,
            ChatSession {
                request_type: request_type.to_string(),
                language,
                ticket_id: ticket.id,
            },
        );
        info!(chat_id, ticket_id = ticket.id, request_type, "chat session opened");
        Ok(ticket)
    }

    /// A text message from the chat.
    pub async fn handle_text(
        &self,
        engine: &RoutingEngine,
        chat_id: &str,
        text: &str,
        username: Option<&str>,
    ) -> Result<ChatReply, EngineError> {
        let text = text.trim();
        let Some(session) = self.get(chat_id) else {
            return Ok(ChatReply::ChooseRequestType);
        };
        let language = detect_language(text, &session.language);

        let outcome = match engine
            .continue_conversation(session.ticket_id, text, Some(language))
            .await
        {
            Err(EngineError::NotFound(missing)) => {
                debug!(chat_id, ticket_id = missing, "session ticket is gone, opening a new one");
                let outcome = engine
                    .create_from_inbound(Inbound {
                        subject: menu_label(&session.request_type).to_string(),
                        description: text.to_string(),
                        channel: Channel::ChatBot,
                        language: language.to_string(),
                        customer: CustomerIdentity {
                            email: None,
                            username: username.map(str::to_string),
                            external_user_id: Some(chat_id.to_string()),
                        },
                        request_type: Some(session.request_type.clone()),
                    })
                    .await?;
                self.put(
                    chat_id,
                    ChatSession {
                        ticket_id: outcome.ticket.id,
                        ..session
                    },
                );
                outcome
            }
            other => other?,
        };

        Ok(match outcome.reply {
            Some(text) => ChatReply::Answered {
                ticket: outcome.ticket,
                text,
            },
            None => ChatReply::Forwarded {
                ticket: outcome.ticket,
            },
        })
    }

    /// "Yes, thanks": close the ticket and forget the chat.
    pub fn confirm(
        &self,
        engine: &RoutingEngine,
        chat_id: &str,
        ticket_id: TicketId,
    ) -> Result<Ticket, EngineError> {
        let ticket = engine.confirm_resolved(ticket_id)?;
        self.end(chat_id);
        Ok(ticket)
    }
}
