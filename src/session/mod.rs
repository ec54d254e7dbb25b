//! Best-effort cap on concurrent sessions per account.
//!
//! The store is advisory: losing it makes the cap looser, never the system
//! incorrect. Each session is recorded with its token's `exp`, so a session
//! stops counting once its token can no longer be used. `may_admit` followed
//! by `admit` is check-then-act, so two logins racing for the last slot can
//! both pass and briefly exceed `max_sessions`.

mod memory;
mod redis_store;

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::clock::Clock;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store error: {0}")]
    Backend(String),
    #[error("session store timed out after {0:?}")]
    Timeout(Duration),
}

/// Opaque session ids per key, each with its own expiry in unix seconds.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Live sessions only: members expiring at or before `now` are dropped.
    async fn count(&self, key: &str, now: i64) -> Result<usize, SessionStoreError>;
    async fn add(&self, key: &str, session_id: &str, expires_at: i64)
    -> Result<(), SessionStoreError>;
    async fn remove(&self, key: &str, session_id: &str) -> Result<(), SessionStoreError>;
    async fn clear(&self, key: &str) -> Result<(), SessionStoreError>;
}

#[derive(Clone)]
pub struct SessionLimiter {
    store: Arc<dyn SessionStore>,
    max_sessions: usize,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SessionLimiter {
    pub fn new(
        store: Arc<dyn SessionStore>,
        max_sessions: usize,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            max_sessions,
            clock,
            timeout,
        }
    }

    /// False only when the store answers with a count at or over the cap.
    pub async fn may_admit(&self, key: &str) -> bool {
        let now = self.clock.now().timestamp();
        match self.bounded(self.store.count(key, now)).await {
            Ok(count) => count < self.max_sessions,
            Err(err) => {
                tracing::warn!(error = %err, "session store unavailable, admitting login");
                true
            }
        }
    }

    /// Records the session until `expires_at`, the token's `exp`.
    pub async fn admit(&self, key: &str, session_id: &str, expires_at: usize) {
        let expires_at = i64::try_from(expires_at).unwrap_or(i64::MAX);
        if let Err(err) = self.bounded(self.store.add(key, session_id, expires_at)).await {
            tracing::warn!(error = %err, "failed to record session");
        }
    }

    pub async fn revoke(&self, key: &str, session_id: &str) {
        if let Err(err) = self.bounded(self.store.remove(key, session_id)).await {
            tracing::warn!(error = %err, "failed to revoke session");
        }
    }

    pub async fn revoke_all(&self, key: &str) {
        if let Err(err) = self.bounded(self.store.clear(key)).await {
            tracing::warn!(error = %err, "failed to revoke sessions");
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SessionStoreError>>,
    ) -> Result<T, SessionStoreError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| SessionStoreError::Timeout(self.timeout))?
    }
}
