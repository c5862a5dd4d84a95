//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{CacheError, CacheStore};

/// Redis cache over a shared tokio connection manager.
///
/// The connection manager reconnects on its own; a request that races a
/// reconnect surfaces as `CacheError::Connection`, which callers absorb.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    /// Wrap an existing connection manager (shared with other Redis adapters).
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Open a dedicated connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        // Redis rejects EX 0; sub-second TTLs round up to the minimum.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(())
    }
}
