//! Model gateways: text classification and answer/summary generation.
//!
//! Offline fallbacks are always available; the chat-completion client is
//! behind the `http` feature.

mod config;
mod error;
mod gateway;
pub mod parse;
pub mod prompts;

#[cfg(feature = "http")]
mod chat;

pub use config::{AiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::AiError;
pub use gateway::{
    Answer, Classify, FALLBACK_EXCERPT_CHARS, FALLBACK_MODEL, FallbackClassifier,
    FallbackResponder, Gateways, Respond, select,
};

#[cfg(feature = "http")]
pub use chat::{ChatClassifier, ChatClient, ChatResponder};
