//! Channel adapters around the routing engine: mail threading, chat-bot
//! sessions and (with `http`) Telegram delivery.

mod language;
pub mod mail;
pub mod sessions;

#[cfg(feature = "http")]
mod telegram;

pub use language::detect_language;
pub use mail::{OutgoingMail, handle_inbound_mail, parse_ticket_tag, reply_subject};
pub use sessions::{ChatReply, ChatSession, ChatSessions, REQUEST_MENU};

#[cfg(feature = "http")]
pub use telegram::TelegramDelivery;

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use helpdesk_ai::{AiError, Classify, Gateways};
    use helpdesk_core::{Classification, NewFaqEntry, Priority};
    use helpdesk_router::{EngineConfig, RoutingEngine};
    use helpdesk_store::{MemoryStore, TicketStore};

    /// Confident internet-outage classifier.
    struct Outage;

    #[async_trait]
    impl Classify for Outage {
        fn model_name(&self) -> &str {
            "outage"
        }

        async fn classify(
            &self,
            _text: &str,
            _request_type: Option<&str>,
        ) -> Result<Classification, AiError> {
            Ok(Classification {
                category_code: "INTERNET_HOME".into(),
                department_code: "technical_support".into(),
                priority: Priority::P2,
                language: "ru".into(),
                auto_resolvable: true,
                confidence: 0.9,
            })
        }
    }

    pub(crate) fn offline_engine() -> (RoutingEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = RoutingEngine::new(store.clone(), Gateways::offline(), EngineConfig::default());
        (engine, store)
    }

    /// Engine whose classifier always qualifies and whose FAQ answers with
    /// `answer`.
    pub(crate) fn confident_engine(answer: &str) -> (RoutingEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .add_faq(NewFaqEntry {
                question: "Нет интернета".into(),
                answer: answer.into(),
                language: "ru".into(),
                category_code: Some("INTERNET_HOME".into()),
                auto_resolvable: true,
            })
            .unwrap();
        let gateways = Gateways {
            classifier: Arc::new(Outage),
            ..Gateways::offline()
        };
        let engine = RoutingEngine::new(store.clone(), gateways, EngineConfig::default());
        (engine, store)
    }
}
