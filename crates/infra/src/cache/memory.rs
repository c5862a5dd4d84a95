//! In-memory cache store for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{CacheError, CacheStore};

/// In-memory TTL cache.
///
/// - No IO / no background eviction: expired entries are dropped lazily on
///   `get`
/// - Can be built failing, where every call errors, to exercise the
///   cache-is-never-fatal paths
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
    fail: bool,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose every call fails with a connection error.
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        if self.fail {
            return Err(CacheError::Connection("simulated cache failure".to_string()));
        }

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Connection("cache poisoned".to_string()))?;

        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        if self.fail {
            return Err(CacheError::Connection("simulated cache failure".to_string()));
        }

        self.entries
            .lock()
            .map_err(|_| CacheError::Connection("cache poisoned".to_string()))?
            .insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_none_on_absent_key() {
        let cache = InMemoryCacheStore::new();
        assert_eq!(cache.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get_within_ttl() {
        let cache = InMemoryCacheStore::new();
        cache
            .put("k", b"v", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let cache = InMemoryCacheStore::new();
        cache
            .put("k", b"v", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn failing_cache_errors_on_both_calls() {
        let cache = InMemoryCacheStore::failing();
        assert!(cache.get("k").await.is_err());
        assert!(cache.put("k", b"v", Duration::from_secs(1)).await.is_err());
    }
}
