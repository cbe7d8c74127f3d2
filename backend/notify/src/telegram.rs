//! Telegram Bot API binding over reqwest.
//!
//! Speaks the HTTP API directly so platform responses map cleanly onto the
//! transient/permanent `ChatError` taxonomy: HTTP 429 carries the
//! platform-advertised retry delay, 5xx and connection problems are
//! transient, 403 means the recipient is unreachable, 4xx means we built a
//! bad request.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::chat::{ChatClient, ChatError, MessageRef};

const API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(API_BASE, token)
    }

    /// Point at a different server (tests, local Bot API instances).
    pub fn with_base_url(base: &str, token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, base_url: format!("{base}/bot{token}") }
    }

    pub(crate) async fn call(&self, method: &str, payload: Value) -> Result<Value, ChatError> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body: Value = response.json().await.map_err(request_error)?;

        if body["ok"].as_bool() == Some(true) {
            debug!(method, "Chat platform call ok");
            return Ok(body["result"].clone());
        }

        let description = body["description"].as_str().unwrap_or("unknown error").to_string();
        match status.as_u16() {
            429 => {
                let retry_after_secs =
                    body["parameters"]["retry_after"].as_u64().unwrap_or(1);
                Err(ChatError::RateLimited { retry_after_secs })
            }
            403 => Err(ChatError::Rejected(description)),
            code if code >= 500 => Err(ChatError::Network(description)),
            _ => Err(ChatError::BadRequest(description)),
        }
    }

    async fn call_message(&self, method: &str, payload: Value) -> Result<MessageRef, ChatError> {
        let result = self.call(method, payload).await?;
        Ok(result["message_id"].as_i64().unwrap_or_default())
    }

    async fn call_unit(&self, method: &str, payload: Value) -> Result<(), ChatError> {
        self.call(method, payload).await.map(|_| ())
    }
}

fn request_error(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout
    } else {
        ChatError::Network(e.to_string())
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<MessageRef, ChatError> {
        self.call_message("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    async fn send_in_topic(
        &self,
        chat_id: i64,
        topic_id: i64,
        text: &str,
    ) -> Result<MessageRef, ChatError> {
        self.call_message(
            "sendMessage",
            json!({ "chat_id": chat_id, "message_thread_id": topic_id, "text": text }),
        )
        .await
    }

    async fn send_with_button(
        &self,
        chat_id: i64,
        text: &str,
        label: &str,
        callback: &str,
    ) -> Result<MessageRef, ChatError> {
        self.call_message(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "reply_markup": {
                    "inline_keyboard": [[{ "text": label, "callback_data": callback }]]
                }
            }),
        )
        .await
    }

    async fn send_video(
        &self,
        chat_id: i64,
        file_ref: &str,
        caption: &str,
    ) -> Result<MessageRef, ChatError> {
        self.call_message(
            "sendVideo",
            json!({ "chat_id": chat_id, "video": file_ref, "caption": caption }),
        )
        .await
    }

    async fn delete_message(
        &self,
        chat_id: i64,
        message_id: MessageRef,
    ) -> Result<(), ChatError> {
        self.call_unit(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
    }

    async fn edit_topic_name(
        &self,
        chat_id: i64,
        topic_id: i64,
        name: &str,
    ) -> Result<(), ChatError> {
        self.call_unit(
            "editForumTopic",
            json!({ "chat_id": chat_id, "message_thread_id": topic_id, "name": name }),
        )
        .await
    }

    async fn close_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError> {
        self.call_unit(
            "closeForumTopic",
            json!({ "chat_id": chat_id, "message_thread_id": topic_id }),
        )
        .await
    }

    async fn reopen_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError> {
        self.call_unit(
            "reopenForumTopic",
            json!({ "chat_id": chat_id, "message_thread_id": topic_id }),
        )
        .await
    }

    async fn delete_topic(&self, chat_id: i64, topic_id: i64) -> Result<(), ChatError> {
        self.call_unit(
            "deleteForumTopic",
            json!({ "chat_id": chat_id, "message_thread_id": topic_id }),
        )
        .await
    }
}
