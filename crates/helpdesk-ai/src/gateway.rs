//! Gateway traits and the deterministic offline implementations.
//!
//! One implementation per provider plus a fallback; [`select`] picks once at
//! startup so routing code never branches on configuration.

use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_core::Classification;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::parse::excerpt;
use crate::{AiConfig, AiError};

/// Length of the excerpt returned when no generator is configured.
pub const FALLBACK_EXCERPT_CHARS: usize = 500;

/// Model name recorded in the audit log for the offline implementations.
pub const FALLBACK_MODEL: &str = "fallback";

/// Generated customer-facing answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub language: String,
}

#[async_trait]
pub trait Classify: Send + Sync {
    fn model_name(&self) -> &str;

    /// Raw classifier output. The keyword correction is applied by the caller.
    async fn classify(
        &self,
        text: &str,
        request_type: Option<&str>,
    ) -> Result<Classification, AiError>;
}

#[async_trait]
pub trait Respond: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        context: &str,
        language: &str,
        request_type: Option<&str>,
    ) -> Result<Answer, AiError>;

    async fn summarize(&self, transcript: &str, language: &str) -> Result<String, AiError>;

    async fn suggest_replies(
        &self,
        transcript: &str,
        language: &str,
        request_type: Option<&str>,
        max: usize,
    ) -> Result<Vec<String>, AiError>;
}

// ── Offline fallbacks ──

/// Always returns [`Classification::fallback`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackClassifier;

#[async_trait]
impl Classify for FallbackClassifier {
    fn model_name(&self) -> &str {
        FALLBACK_MODEL
    }

    async fn classify(
        &self,
        _text: &str,
        _request_type: Option<&str>,
    ) -> Result<Classification, AiError> {
        Ok(Classification::fallback())
    }
}

/// Echoes a bounded excerpt of its input and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

#[async_trait]
impl Respond for FallbackResponder {
    fn model_name(&self) -> &str {
        FALLBACK_MODEL
    }

    async fn generate(
        &self,
        context: &str,
        language: &str,
        _request_type: Option<&str>,
    ) -> Result<Answer, AiError> {
        Ok(Answer {
            text: excerpt(context, FALLBACK_EXCERPT_CHARS),
            language: language.to_string(),
        })
    }

    async fn summarize(&self, transcript: &str, _language: &str) -> Result<String, AiError> {
        Ok(excerpt(transcript, FALLBACK_EXCERPT_CHARS))
    }

    async fn suggest_replies(
        &self,
        _transcript: &str,
        _language: &str,
        _request_type: Option<&str>,
        _max: usize,
    ) -> Result<Vec<String>, AiError> {
        Ok(Vec::new())
    }
}

// ── Selection ──

/// The pair of gateways the engine is built with.
#[derive(Clone)]
pub struct Gateways {
    pub classifier: Arc<dyn Classify>,
    pub responder: Arc<dyn Respond>,
}

impl Gateways {
    pub fn offline() -> Self {
        Self {
            classifier: Arc::new(FallbackClassifier),
            responder: Arc::new(FallbackResponder),
        }
    }
}

/// Pick provider-backed gateways when a key is configured, fallbacks otherwise.
pub fn select(config: &AiConfig) -> Result<Gateways, AiError> {
    let Some(key) = config.key() else {
        info!("no model API key configured, using offline fallbacks");
        return Ok(Gateways::offline());
    };
    provider(config, key)
}

#[cfg(feature = "http")]
fn provider(config: &AiConfig, key: &str) -> Result<Gateways, AiError> {
    use crate::chat::{ChatClassifier, ChatClient, ChatResponder};

    let client = Arc::new(ChatClient::new(config, key)?);
    info!(model = %config.model, base_url = %config.api_root(), "using chat-completion provider");
    Ok(Gateways {
        classifier: Arc::new(ChatClassifier::new(client.clone())),
        responder: Arc::new(ChatResponder::new(client)),
    })
}

#[cfg(not(feature = "http"))]
fn provider(_config: &AiConfig, _key: &str) -> Result<Gateways, AiError> {
    tracing::warn!("model API key set but built without the `http` feature, using offline fallbacks");
    Ok(Gateways::offline())
}
