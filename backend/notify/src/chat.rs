//! Chat-platform client contract.
//!
//! The core never talks HTTP itself; everything human-facing goes through
//! this trait, and only the retrier calls it directly.

use async_trait::async_trait;
use paceline_core::PacelineError;
use thiserror::Error;

/// Platform message id, returned so transient messages can be deleted later.
pub type MessageRef = i64;

/// Delivery failure taxonomy. The first three are transient and worth a
/// bounded retry; the last two are permanent and propagate immediately.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("rate limited by the platform, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("recipient unreachable: {0}")]
    Rejected(String),

    #[error("malformed request: {0}")]
    BadRequest(String),
}

impl ChatError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_) | Self::Timeout)
    }
}

impl From<ChatError> for PacelineError {
    fn from(e: ChatError) -> Self {
        if e.is_transient() {
            PacelineError::TransientDelivery(e.to_string())
        } else {
            PacelineError::PermanentDelivery(e.to_string())
        }
    }
}

/// Outbound operations the program needs from the chat platform.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<MessageRef, ChatError>;

    /// Message into a forum topic (the per-course audit thread).
    async fn send_in_topic(
        &self,
        chat_id: i64,
        topic_id: i64,
        text: &str,
    ) -> Result<MessageRef, ChatError>;

    /// Message carrying a single inline action button.
    async fn send_with_button(
        &self,
        chat_id: i64,
        text: &str,
        label: &str,
        callback: &str,
    ) -> Result<MessageRef, ChatError>;

    async fn send_video(
        &self,
        chat_id: i64,
        file_ref: &str,
        caption: &str,
    ) -> Result<MessageRef, ChatError>;

    async fn delete_message(&self, chat_id: i64, message_id: MessageRef)
        -> Result<(), ChatError>;

    async fn edit_topic_name(
        &self,
        chat_id: i64,
        topic_id: i64,
        name: &str,
    ) -> Result<(), ChatError>;

    async fn close_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError>;

    async fn reopen_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError>;

    async fn delete_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError>;
}
