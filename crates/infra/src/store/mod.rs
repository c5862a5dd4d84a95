//! Transactional record store.
//!
//! The store is the authoritative side of the system: writes are atomic
//! transactions with server-assigned timestamps, reads are snapshot-consistent
//! with respect to concurrently committing writers. Connection pooling and
//! transaction mechanics belong to the backing database; this module only
//! defines the narrow contract the orchestrator consumes.

mod memory;
mod postgres;

pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;

use async_trait::async_trait;
use thiserror::Error;

use packrat_core::{ItemId, ItemView, UserId, UserRecord};

/// Store failure taxonomy.
///
/// `Conflict` (a transient transaction abort) is distinguished from the
/// permanent variants so a caller could in principle retry it; the three
/// operations here issue single independent statements and do not.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database was unreachable or the pool was closed.
    #[error("store connection failed: {0}")]
    Connection(String),

    /// A constraint was violated (duplicate key, bad reference).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The transaction aborted due to a serialization conflict or deadlock.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// A row required by the write policy's reference check does not exist.
    #[error("referenced row not found: {0}")]
    NotFound(String),
}

/// Configurable strictness of association writes.
///
/// The permissive defaults reproduce the historical behavior: duplicate
/// user/item pairs are tolerated ("own two of the same item") and referential
/// integrity is the caller's ordering responsibility.
#[derive(Debug, Copy, Clone)]
pub struct WritePolicy {
    /// Allow the same `(user_id, item_id)` pair to be inserted repeatedly.
    pub allow_duplicates: bool,
    /// Verify the user row exists inside the same transaction before
    /// inserting an association.
    pub check_references: bool,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            allow_duplicates: true,
            check_references: false,
        }
    }
}

impl WritePolicy {
    pub fn strict() -> Self {
        Self {
            allow_duplicates: false,
            check_references: true,
        }
    }
}

/// The narrow transactional contract the orchestrator relies on.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a user record atomically; `created_at`/`updated_at` are
    /// assigned by the store's clock, not the caller's.
    async fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError>;

    /// Insert a user/item association atomically, subject to the store's
    /// [`WritePolicy`].
    async fn insert_user_item(&self, user_id: UserId, item_id: &ItemId)
    -> Result<(), StoreError>;

    /// Snapshot read of the user's items joined with catalog names, in
    /// store-default order (callers must not depend on order).
    async fn list_user_items(&self, user_id: UserId) -> Result<Vec<ItemView>, StoreError>;
}

#[async_trait]
impl<S> RecordStore for std::sync::Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        (**self).insert_user(user).await
    }

    async fn insert_user_item(
        &self,
        user_id: UserId,
        item_id: &ItemId,
    ) -> Result<(), StoreError> {
        (**self).insert_user_item(user_id, item_id).await
    }

    async fn list_user_items(&self, user_id: UserId) -> Result<Vec<ItemView>, StoreError> {
        (**self).list_user_items(user_id).await
    }
}
