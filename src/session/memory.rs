use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{SessionStore, SessionStoreError};

/// In-process store used when no Redis URL is configured. Not shared across
/// instances, so the cap is per process.
#[derive(Default)]
pub struct MemorySessionStore {
    // key -> session id -> expiry (unix seconds)
    entries: Mutex<HashMap<String, HashMap<String, i64>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn count(&self, key: &str, now: i64) -> Result<usize, SessionStoreError> {
        let mut entries = self.entries.lock().await;
        let Some(sessions) = entries.get_mut(key) else {
            return Ok(0);
        };

        sessions.retain(|_, expires_at| *expires_at > now);
        let live = sessions.len();
        if live == 0 {
            entries.remove(key);
        }
        Ok(live)
    }

    async fn add(
        &self,
        key: &str,
        session_id: &str,
        expires_at: i64,
    ) -> Result<(), SessionStoreError> {
        self.entries
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .insert(session_id.to_string(), expires_at);
        Ok(())
    }

    async fn remove(&self, key: &str, session_id: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().await;
        if let Some(sessions) = entries.get_mut(key) {
            sessions.remove(session_id);
            if sessions.is_empty() {
                entries.remove(key);
            }
        }
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), SessionStoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
