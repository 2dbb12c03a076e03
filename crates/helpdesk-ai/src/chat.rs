//! OpenAI-compatible chat-completion client and the gateways built on it.

use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_core::Classification;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gateway::{Answer, Classify, Respond};
use crate::parse::{parse_classification, parse_suggestions};
use crate::{AiConfig, AiError, prompts};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// HTTP client for `POST {root}/chat/completions`.
pub struct ChatClient {
    client: reqwest::Client,
    api_root: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    pub fn new(config: &AiConfig, api_key: &str) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_root: config.api_root(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system + user exchange; returns the first choice's content.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.api_root);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        debug!(url = %url, model = %self.model, "chat completion request");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::Protocol("response has no choices".into()))
    }
}

pub struct ChatClassifier {
    client: Arc<ChatClient>,
}

impl ChatClassifier {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Classify for ChatClassifier {
    fn model_name(&self) -> &str {
        self.client.model()
    }

    async fn classify(
        &self,
        text: &str,
        request_type: Option<&str>,
    ) -> Result<Classification, AiError> {
        let content = self
            .client
            .chat(&prompts::classification(request_type), text)
            .await?;
        parse_classification(&content)
    }
}

pub struct ChatResponder {
    client: Arc<ChatClient>,
}

impl ChatResponder {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Respond for ChatResponder {
    fn model_name(&self) -> &str {
        self.client.model()
    }

    async fn generate(
        &self,
        context: &str,
        language: &str,
        request_type: Option<&str>,
    ) -> Result<Answer, AiError> {
        let content = self
            .client
            .chat(&prompts::answer(language, request_type), context)
            .await?;
        let text = content.trim();
        if text.is_empty() {
            return Err(AiError::Protocol("empty answer".into()));
        }
        Ok(Answer {
            text: text.to_string(),
            language: language.to_string(),
        })
    }

    async fn summarize(&self, transcript: &str, language: &str) -> Result<String, AiError> {
        let content = self.client.chat(&prompts::summary(language), transcript).await?;
        Ok(content.trim().to_string())
    }

    async fn suggest_replies(
        &self,
        transcript: &str,
        language: &str,
        request_type: Option<&str>,
        max: usize,
    ) -> Result<Vec<String>, AiError> {
        let content = self
            .client
            .chat(&prompts::suggestions(language, request_type, max), transcript)
            .await?;
        parse_suggestions(&content, max)
    }
}
