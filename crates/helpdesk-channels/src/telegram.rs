//! Telegram Bot API delivery for agent replies.

use std::time::Duration;

use async_trait::async_trait;
use helpdesk_router::{Deliver, DeliveryError};
use tracing::info;

const API_ROOT: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends plain text to a chat through `sendMessage`.
pub struct TelegramDelivery {
    client: reqwest::Client,
    api_root: String,
    token: String,
}

impl TelegramDelivery {
    pub fn new(token: impl Into<String>) -> Result<Self, DeliveryError> {
        Self::with_api_root(token, API_ROOT)
    }

    /// Same as [`new`](Self::new) against a different Bot API host.
    pub fn with_api_root(
        token: impl Into<String>,
        api_root: &str,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_root: api_root.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_root, self.token)
    }
}

#[async_trait]
impl Deliver for TelegramDelivery {
    async fn deliver(&self, recipient: &str, text: &str) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({ "chat_id": recipient, "text": text });
        let resp = self
            .client
            .post(self.send_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!(chat_id = recipient, "telegram message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_url_embeds_token() {
        let delivery = TelegramDelivery::with_api_root("123:abc", "http://localhost:8081/").unwrap();
        assert_eq!(delivery.send_url(), "http://localhost:8081/bot123:abc/sendMessage");
        let default = TelegramDelivery::new("t").unwrap();
        assert_eq!(default.send_url(), "https://api.telegram.org/bott/sendMessage");
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        let delivery = TelegramDelivery::with_api_root("t", "http://127.0.0.1:9").unwrap();
        let err = delivery.deliver("1", "hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }
}
