use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tokio::sync::OnceCell;

use super::{SessionStore, SessionStoreError};

const KEY_PREFIX: &str = "sessions:";

/// One sorted set per account key, scored by each session's expiry. Expired
/// members are dropped before counting.
pub struct RedisSessionStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisSessionStore {
    /// Parses the URL only; the connection is opened on first use so startup
    /// does not depend on Redis being up.
    pub fn new(redis_url: &str) -> Result<Self, SessionStoreError> {
        let client = Client::open(redis_url)
            .map_err(|err| SessionStoreError::Backend(format!("invalid redis url: {err}")))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, SessionStoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new().set_number_of_retries(1);
                self.client.get_connection_manager_with_config(config).await
            })
            .await
            .map_err(backend)?;
        Ok(manager.clone())
    }
}

fn record_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

fn backend(err: redis::RedisError) -> SessionStoreError {
    SessionStoreError::Backend(err.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn count(&self, key: &str, now: i64) -> Result<usize, SessionStoreError> {
        let mut conn = self.connection().await?;
        let key = record_key(key);
        let (live,): (usize,) = redis::pipe()
            .atomic()
            .zrembyscore(&key, "-inf", now)
            .ignore()
            .zcard(&key)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(live)
    }

    async fn add(
        &self,
        key: &str,
        session_id: &str,
        expires_at: i64,
    ) -> Result<(), SessionStoreError> {
        let mut conn = self.connection().await?;
        let key = record_key(key);
        // Every session gets the same token lifetime, so the newest one
        // always carries the latest expiry for the whole key.
        redis::pipe()
            .atomic()
            .zadd(&key, session_id, expires_at)
            .ignore()
            .expire_at(&key, expires_at)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(backend)
    }

    async fn remove(&self, key: &str, session_id: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.connection().await?;
        conn.zrem::<_, _, ()>(record_key(key), session_id)
            .await
            .map_err(backend)
    }

    async fn clear(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(record_key(key)).await.map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use crate::{clock::SystemClock, session::SessionLimiter};

    use super::{RedisSessionStore, record_key};

    #[test]
    fn rejects_malformed_url() {
        assert!(RedisSessionStore::new("not a url").is_err());
    }

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(record_key("a@x.com"), "sessions:a@x.com");
    }

    #[tokio::test]
    async fn unreachable_redis_fails_open() {
        let store = RedisSessionStore::new("redis://127.0.0.1:1/").expect("url should parse");
        let limiter = SessionLimiter::new(
            Arc::new(store),
            1,
            Arc::new(SystemClock),
            Duration::from_millis(200),
        );

        assert!(limiter.may_admit("a@x.com").await);
        limiter.admit("a@x.com", "s1", usize::MAX).await;
    }
}
