//! Bounded-retry wrapper around outbound chat-platform calls.
//!
//! Transient failures (rate limit, network, timeout) get a small number of
//! extra attempts; rate limits wait the platform-advertised delay plus a
//! pad, the rest back off exponentially. Permanent failures propagate
//! immediately. Delivery stays best-effort either way: callers never roll
//! back a committed transition because a notification failed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::chat::{ChatClient, ChatError, MessageRef};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Base delay for the exponential backoff (base × 2^attempt).
    pub base_delay: Duration,
    /// Added on top of a platform-advertised rate-limit delay.
    pub rate_limit_pad: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            rate_limit_pad: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

pub struct NotificationRetrier {
    client: Arc<dyn ChatClient>,
    policy: RetryPolicy,
}

impl NotificationRetrier {
    pub fn new(client: Arc<dyn ChatClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    async fn run<T, F, Fut>(&self, what: &str, op: F) -> Result<T, ChatError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ChatError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => {
                    warn!(what, error = %e, "Permanent delivery failure, not retrying");
                    return Err(e);
                }
                Err(e) if attempt >= self.policy.max_retries => {
                    warn!(what, attempt, error = %e, "Delivery retries exhausted");
                    return Err(e);
                }
                Err(ChatError::RateLimited { retry_after_secs }) => {
                    let wait =
                        Duration::from_secs(retry_after_secs) + self.policy.rate_limit_pad;
                    debug!(what, attempt, wait_ms = wait.as_millis() as u64, "Rate limited");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    let wait = self.policy.backoff_for(attempt);
                    debug!(what, attempt, error = %e, wait_ms = wait.as_millis() as u64,
                        "Transient delivery failure, backing off");
                    tokio::time::sleep(wait).await;
                }
            }
            attempt += 1;
        }
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<MessageRef, ChatError> {
        self.run("send_message", || self.client.send_message(chat_id, text)).await
    }

    pub async fn send_in_topic(
        &self,
        chat_id: i64,
        topic_id: i64,
        text: &str,
    ) -> Result<MessageRef, ChatError> {
        self.run("send_in_topic", || self.client.send_in_topic(chat_id, topic_id, text))
            .await
    }

    pub async fn send_with_button(
        &self,
        chat_id: i64,
        text: &str,
        label: &str,
        callback: &str,
    ) -> Result<MessageRef, ChatError> {
        self.run("send_with_button", || {
            self.client.send_with_button(chat_id, text, label, callback)
        })
        .await
    }

    pub async fn send_video(
        &self,
        chat_id: i64,
        file_ref: &str,
        caption: &str,
    ) -> Result<MessageRef, ChatError> {
        self.run("send_video", || self.client.send_video(chat_id, file_ref, caption))
            .await
    }

    pub async fn delete_message(
        &self,
        chat_id: i64,
        message_id: MessageRef,
    ) -> Result<(), ChatError> {
        self.run("delete_message", || self.client.delete_message(chat_id, message_id))
            .await
    }

    pub async fn edit_topic_name(
        &self,
        chat_id: i64,
        topic_id: i64,
        name: &str,
    ) -> Result<(), ChatError> {
        self.run("edit_topic_name", || self.client.edit_topic_name(chat_id, topic_id, name))
            .await
    }

    pub async fn close_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError> {
        self.run("close_topic", || self.client.close_topic(chat_id, topic_id)).await
    }

    pub async fn reopen_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError> {
        self.run("reopen_topic", || self.client.reopen_topic(chat_id, topic_id)).await
    }

    pub async fn delete_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError> {
        self.run("delete_topic", || self.client.delete_topic(chat_id, topic_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` sends with the given error, then succeeds.
    struct FlakyChat {
        failures: u32,
        error: ChatError,
        attempts: AtomicU32,
    }

    impl FlakyChat {
        fn new(failures: u32, error: ChatError) -> Self {
            Self { failures, error, attempts: AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl ChatClient for FlakyChat {
        async fn send_message(&self, _: i64, _: &str) -> Result<MessageRef, ChatError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(1000 + n as i64)
            }
        }

        async fn send_in_topic(&self, c: i64, _: i64, t: &str) -> Result<MessageRef, ChatError> {
            self.send_message(c, t).await
        }
        async fn send_with_button(
            &self,
            c: i64,
            t: &str,
            _: &str,
            _: &str,
        ) -> Result<MessageRef, ChatError> {
            self.send_message(c, t).await
        }
        async fn send_video(&self, c: i64, _: &str, t: &str) -> Result<MessageRef, ChatError> {
            self.send_message(c, t).await
        }
        async fn delete_message(&self, c: i64, _: MessageRef) -> Result<(), ChatError> {
            self.send_message(c, "").await.map(|_| ())
        }
        async fn edit_topic_name(&self, c: i64, _: i64, _: &str) -> Result<(), ChatError> {
            self.send_message(c, "").await.map(|_| ())
        }
        async fn close_topic(&self, c: i64, _: i64) -> Result<(), ChatError> {
            self.send_message(c, "").await.map(|_| ())
        }
        async fn reopen_topic(&self, c: i64, _: i64) -> Result<(), ChatError> {
            self.send_message(c, "").await.map(|_| ())
        }
        async fn delete_topic(&self, c: i64, _: i64) -> Result<(), ChatError> {
            self.send_message(c, "").await.map(|_| ())
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            rate_limit_pad: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let client = Arc::new(FlakyChat::new(2, ChatError::Network("reset".into())));
        let retrier = NotificationRetrier::new(client.clone(), fast_policy());
        let msg = retrier.send_message(1, "hi").await.unwrap();
        assert_eq!(client.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(msg, 1002);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let client = Arc::new(FlakyChat::new(10, ChatError::Timeout));
        let retrier = NotificationRetrier::new(client.clone(), fast_policy());
        assert!(retrier.send_message(1, "hi").await.is_err());
        // First attempt plus max_retries extras.
        assert_eq!(client.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_rejection_is_never_retried() {
        let client = Arc::new(FlakyChat::new(10, ChatError::Rejected("blocked".into())));
        let retrier = NotificationRetrier::new(client.clone(), fast_policy());
        let err = retrier.send_message(1, "hi").await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(client.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limit_waits_then_succeeds() {
        let client =
            Arc::new(FlakyChat::new(1, ChatError::RateLimited { retry_after_secs: 0 }));
        let retrier = NotificationRetrier::new(client.clone(), fast_policy());
        assert!(retrier.send_message(1, "hi").await.is_ok());
        assert_eq!(client.attempts.load(Ordering::SeqCst), 2);
    }
}
