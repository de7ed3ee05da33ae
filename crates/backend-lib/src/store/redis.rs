// ============================
// crates/backend-lib/src/store/redis.rs
// ============================
//! Redis-backed session store.
use super::{SessionStore, StoreError};
use crate::config::RedisSettings;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

/// Session store backed by a multiplexed, auto-reconnecting Redis connection
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect and `PING`, giving up after `settings.connect_timeout_secs`
    pub async fn connect(settings: &RedisSettings) -> Result<Self, StoreError> {
        let client = redis::Client::open(settings.url.as_str())?;
        let timeout = Duration::from_secs(settings.connect_timeout_secs);

        let conn = tokio::time::timeout(timeout, async {
            let mut conn = ConnectionManager::new(client).await?;
            let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, StoreError>(conn)
        })
        .await
        .map_err(|_| {
            StoreError::Unavailable(format!(
                "no answer from redis within {}s",
                settings.connect_timeout_secs
            ))
        })??;

        info!(timeout_secs = settings.connect_timeout_secs, "Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // PSETEX rejects a zero expiry
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = conn.pset_ex(key, value, millis).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(keys).await?;
        Ok(removed)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    fn settings(url: String, connect_timeout_secs: u64) -> RedisSettings {
        RedisSettings {
            url,
            connect_timeout_secs,
        }
    }

    #[tokio::test]
    async fn test_connect_gives_up_on_silent_server() {
        // accepts connections, never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let started = Instant::now();
        let result = RedisSessionStore::connect(&settings(format!("redis://{addr}/0"), 1)).await;
        let elapsed = started.elapsed();
        silent.abort();

        match result {
            Err(StoreError::Unavailable(msg)) => assert!(msg.contains("1s"), "{msg}"),
            Err(other) => panic!("expected Unavailable, got {other}"),
            Ok(_) => panic!("connected to a server that never replied"),
        }
        assert!(elapsed >= Duration::from_millis(900), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = RedisSessionStore::connect(&settings("not a redis url".into(), 1)).await;
        assert!(matches!(result, Err(StoreError::Redis(_))));
    }
}
