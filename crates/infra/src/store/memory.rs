//! In-memory record store for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use packrat_core::{ItemId, ItemView, UserId, UserRecord};

use super::{RecordStore, StoreError, WritePolicy};

/// In-memory store with the same transactional semantics observable from the
/// outside: writes are all-or-nothing under one lock, reads see a consistent
/// snapshot.
///
/// Reads are counted so interaction tests can assert the cache-hit path never
/// touches the store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<Tables>,
    policy: WritePolicy,
    reads: AtomicU64,
    fail: AtomicBool,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, String>,
    catalog: HashMap<String, String>,
    user_items: Vec<(UserId, String)>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: WritePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Seed a catalog item (item creation is outside the service's scope).
    pub fn seed_item(&self, item_id: &str, item_name: &str) {
        self.inner
            .lock()
            .unwrap()
            .catalog
            .insert(item_id.to_string(), item_name.to_string());
    }

    /// Number of snapshot reads issued so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a connection error.
    pub fn fail_from_now_on(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(
                "simulated store failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.inner.lock().unwrap();
        if tables.users.contains_key(&user.user_id) {
            return Err(StoreError::Constraint(format!(
                "duplicate user {}",
                user.user_id
            )));
        }
        tables.users.insert(user.user_id, user.user_name.clone());
        Ok(())
    }

    async fn insert_user_item(
        &self,
        user_id: UserId,
        item_id: &ItemId,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.inner.lock().unwrap();

        if self.policy.check_references && !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }
        if !self.policy.allow_duplicates
            && tables
                .user_items
                .iter()
                .any(|(u, i)| *u == user_id && i == item_id.as_str())
        {
            return Err(StoreError::Constraint(format!(
                "user {} already owns item {}",
                user_id, item_id
            )));
        }

        tables
            .user_items
            .push((user_id, item_id.as_str().to_string()));
        Ok(())
    }

    async fn list_user_items(&self, user_id: UserId) -> Result<Vec<ItemView>, StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let tables = self.inner.lock().unwrap();
        // Inner-join semantics: rows without a user or catalog entry drop out.
        let Some(user_name) = tables.users.get(&user_id) else {
            return Ok(Vec::new());
        };

        Ok(tables
            .user_items
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, item_id)| {
                tables.catalog.get(item_id).map(|item_name| ItemView {
                    user_name: user_name.clone(),
                    item_name: item_name.clone(),
                    item_id: item_id.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserRecord {
        UserRecord::new(UserId::new(), name).unwrap()
    }

    #[tokio::test]
    async fn duplicate_pairs_tolerated_by_default() {
        let store = InMemoryRecordStore::new();
        store.seed_item("item-1", "Lamp");
        let alice = user("alice");
        store.insert_user(&alice).await.unwrap();

        let item: ItemId = "item-1".parse().unwrap();
        store.insert_user_item(alice.user_id, &item).await.unwrap();
        store.insert_user_item(alice.user_id, &item).await.unwrap();

        let items = store.list_user_items(alice.user_id).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn strict_policy_rejects_duplicates_and_dangling_references() {
        let store = InMemoryRecordStore::with_policy(WritePolicy::strict());
        store.seed_item("item-1", "Lamp");

        let ghost = UserId::new();
        let item: ItemId = "item-1".parse().unwrap();
        let err = store.insert_user_item(ghost, &item).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let alice = user("alice");
        store.insert_user(&alice).await.unwrap();
        store.insert_user_item(alice.user_id, &item).await.unwrap();
        let err = store
            .insert_user_item(alice.user_id, &item)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn listing_drops_rows_missing_from_the_catalog() {
        let store = InMemoryRecordStore::new();
        let alice = user("alice");
        store.insert_user(&alice).await.unwrap();
        let item: ItemId = "item-unknown".parse().unwrap();
        store.insert_user_item(alice.user_id, &item).await.unwrap();

        let items = store.list_user_items(alice.user_id).await.unwrap();
        assert!(items.is_empty());
    }
}
