//! Inbound side of the Bot API: long-polled updates, reduced to the two
//! shapes the daemon routes on (plain text messages and button callbacks).

use serde_json::{json, Value};

use crate::chat::ChatError;
use crate::telegram::TelegramClient;

#[derive(Debug, Clone)]
pub struct IncomingUpdate {
    pub update_id: i64,
    pub event: IncomingEvent,
}

#[derive(Debug, Clone)]
pub enum IncomingEvent {
    /// A text message; `chat_id` is where to answer.
    Text { chat_id: i64, from_id: i64, text: String },
    /// An inline-button press carrying its callback payload.
    Callback { callback_id: String, from_id: i64, data: String },
    /// Anything else (media, joins, edits); skipped but acknowledged.
    Other,
}

impl TelegramClient {
    /// One long-poll cycle. `offset` must be one past the last update seen.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<IncomingUpdate>, ChatError> {
        let result = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": timeout_secs,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;
        let raw = result.as_array().cloned().unwrap_or_default();
        Ok(raw.iter().map(parse_update).collect())
    }

    /// Acknowledges a button press, optionally flashing a short answer.
    pub async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChatError> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        self.call("answerCallbackQuery", payload).await.map(|_| ())
    }
}

fn parse_update(raw: &Value) -> IncomingUpdate {
    let update_id = raw["update_id"].as_i64().unwrap_or_default();
    if let Some(cb) = raw.get("callback_query") {
        if let (Some(id), Some(data)) = (cb["id"].as_str(), cb["data"].as_str()) {
            return IncomingUpdate {
                update_id,
                event: IncomingEvent::Callback {
                    callback_id: id.to_string(),
                    from_id: cb["from"]["id"].as_i64().unwrap_or_default(),
                    data: data.to_string(),
                },
            };
        }
    }
    if let Some(msg) = raw.get("message") {
        if let Some(text) = msg["text"].as_str() {
            return IncomingUpdate {
                update_id,
                event: IncomingEvent::Text {
                    chat_id: msg["chat"]["id"].as_i64().unwrap_or_default(),
                    from_id: msg["from"]["id"].as_i64().unwrap_or_default(),
                    text: text.to_string(),
                },
            };
        }
    }
    IncomingUpdate { update_id, event: IncomingEvent::Other }
}
