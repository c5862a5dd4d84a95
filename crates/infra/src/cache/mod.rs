//! Key/value cache with per-key expiry.
//!
//! The cache is an advisory, lossy accelerator: a miss is a valid outcome
//! (`Ok(None)`), and a connectivity failure is something callers log and
//! survive by falling back to the transactional store. Nothing in here is a
//! correctness dependency.

mod memory;
mod redis;

pub use memory::InMemoryCacheStore;
pub use redis::RedisCacheStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Cache transport failure.
///
/// Note the absence of a "miss" variant: key-not-found is `Ok(None)` on
/// `get`, never an error.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),
}

/// Get-by-key / put-with-TTL over byte-string values.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value. `Ok(None)` means the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Upsert a value with an absolute expiry of `ttl` from now.
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
}

#[async_trait]
impl<C> CacheStore for std::sync::Arc<C>
where
    C: CacheStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        (**self).put(key, value, ttl).await
    }
}
