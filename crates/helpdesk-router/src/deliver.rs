//! Outbound delivery seam. Implementations live with the channel adapters.

use async_trait::async_trait;

use crate::DeliveryError;

/// Sends a text back to a customer on the channel the ticket came from.
#[async_trait]
pub trait Deliver: Send + Sync {
    /// `recipient` is the channel-specific address (chat id, mailbox, ...).
    async fn deliver(&self, recipient: &str, text: &str) -> Result<(), DeliveryError>;
}
