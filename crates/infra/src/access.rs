//! Data-access orchestration: the three domain operations.
//!
//! Composes the transactional store and the TTL cache into a cache-aside read
//! path and straight-through write paths, with best-effort event emission on
//! success.
//!
//! ## Consistency contract
//!
//! Writes do **not** invalidate the cache. A live `userItems_{user_id}` entry
//! keeps serving its pre-write value until the TTL (default 10 s) elapses.
//! This is deliberate bounded staleness, not an oversight; the alternatives
//! (synchronous delete-on-write, versioned keys) were rejected to keep writes
//! independent of cache availability. The same window applies to catalog
//! fields: the cache key derives from `user_id` only, so an item renamed in
//! the catalog can be served under its old name for up to the TTL.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use packrat_core::{DomainError, ItemId, ItemView, UserId, UserRecord};
use packrat_events::{EventPublisher, PublishMode};

use crate::cache::CacheStore;
use crate::store::RecordStore;

/// Operation failure as seen by boundary callers.
///
/// Deliberately coarse: which collaborator failed is logged here, never
/// exposed. Only validation failures carry detail, since the caller can act
/// on those.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("operation failed")]
    Operation,
}

impl From<DomainError> for AccessError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Orchestrator tuning; both knobs come from [`crate::AppConfig`].
#[derive(Debug, Clone)]
pub struct DataAccessConfig {
    /// How long a populated item-list entry stays valid.
    pub cache_ttl: Duration,
    /// Deployment revision stamped into emitted events.
    pub revision: String,
}

impl Default for DataAccessConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(10),
            revision: String::new(),
        }
    }
}

/// The data-access layer: three operations over two stores and a publisher.
pub struct DataAccess<S, C> {
    store: S,
    cache: C,
    publisher: Arc<EventPublisher>,
    config: DataAccessConfig,
}

/// Cache key for a user's item list.
pub fn item_list_key(user_id: &UserId) -> String {
    format!("userItems_{}", user_id)
}

impl<S, C> DataAccess<S, C>
where
    S: RecordStore,
    C: CacheStore,
{
    pub fn new(
        store: S,
        cache: C,
        publisher: Arc<EventPublisher>,
        config: DataAccessConfig,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
            config,
        }
    }

    /// Create a user with a freshly generated identifier.
    ///
    /// One atomic insert; no cache interaction; store failures surface
    /// unchanged (no retry).
    pub async fn create_user(&self, user_name: &str) -> Result<UserRecord, AccessError> {
        let record = UserRecord::new(UserId::new(), user_name)?;

        self.store.insert_user(&record).await.map_err(|e| {
            error!(user_id = %record.user_id, error = %e, "create_user store write failed");
            AccessError::Operation
        })?;

        self.emit(&record.user_id).await;
        Ok(record)
    }

    /// Attach a catalog item to a user.
    ///
    /// One atomic insert. An existing cache entry for this user is left in
    /// place and stays visible until its TTL expires (see module docs).
    pub async fn add_item_to_user(
        &self,
        user_id: UserId,
        item_id: &ItemId,
    ) -> Result<(), AccessError> {
        self.store
            .insert_user_item(user_id, item_id)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, item_id = %item_id, error = %e,
                    "add_item_to_user store write failed");
                AccessError::Operation
            })?;

        self.emit(&user_id).await;
        Ok(())
    }

    /// List a user's items, cache-aside.
    ///
    /// A cache hit returns without touching the store. On a miss (or any
    /// cache failure, which is logged and absorbed) the store is queried, the
    /// result is written back with the configured TTL, and the store rows
    /// themselves are returned, so the miss path always reflects the snapshot
    /// just read.
    pub async fn list_user_items(&self, user_id: UserId) -> Result<Vec<ItemView>, AccessError> {
        let key = item_list_key(&user_id);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<ItemView>>(&bytes) {
                Ok(views) => {
                    debug!(key = %key, "item list served from cache");
                    self.emit(&user_id).await;
                    return Ok(views);
                }
                Err(e) => {
                    // Corrupt entry: treat as a miss and let the store
                    // repopulate it.
                    warn!(key = %key, error = %e, "discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, falling back to store");
            }
        }

        let views = self.store.list_user_items(user_id).await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "list_user_items store query failed");
            AccessError::Operation
        })?;

        match serde_json::to_vec(&views) {
            Ok(bytes) => {
                if let Err(e) = self.cache.put(&key, &bytes, self.config.cache_ttl).await {
                    warn!(key = %key, error = %e, "cache population failed");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "item list serialization failed"),
        }

        self.emit(&user_id).await;
        Ok(views)
    }

    /// Fire-and-forget notification; failures never reach the caller.
    async fn emit(&self, user_id: &UserId) {
        let payload = serde_json::json!({
            "id": user_id.to_string(),
            "revision": self.config.revision,
        });
        if let Err(e) = self.publisher.publish(&payload, PublishMode::Async).await {
            warn!(user_id = %user_id, error = %e, "event emission failed");
        }
    }
}
