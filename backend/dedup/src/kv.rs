//! Expiring key/value contract and the in-process implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use paceline_core::{Clock, PacelineError};
use tokio::sync::Mutex;

/// Minimal expiring key/value store: everything the dedup ledger and the
/// deadline slots need from their backing cache.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PacelineError>;
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), PacelineError>;
    async fn exists(&self, key: &str) -> Result<bool, PacelineError>;
    async fn del(&self, key: &str) -> Result<(), PacelineError>;
}

struct Entry {
    value: String,
    expires_at: DateTime<FixedOffset>,
}

/// In-process key/value store with clock-driven expiry.
///
/// Expiry is lazy on read; `sweep` drops everything expired in one pass.
pub struct MemoryKv {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryKv {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock }
    }

    /// Flush all expired entries to free memory.
    pub async fn sweep(&self) {
        let now = self.clock.now();
        self.entries.lock().await.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, PacelineError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(e) if e.expires_at > now => Ok(Some(e.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), PacelineError> {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry { value: value.to_string(), expires_at });
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, PacelineError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn del(&self, key: &str) -> Result<(), PacelineError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
