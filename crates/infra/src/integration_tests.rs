//! End-to-end scenarios over in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use packrat_core::ItemView;
use packrat_events::{EventPublisher, InMemorySink, PublisherConfig};

use crate::access::{DataAccess, DataAccessConfig, item_list_key};
use crate::cache::{CacheStore, InMemoryCacheStore};
use crate::store::{InMemoryRecordStore, WritePolicy};

#[tokio::test]
async fn create_attach_list_scenario() {
    let sink = Arc::new(InMemorySink::new());
    let (publisher, handle) = EventPublisher::spawn(
        sink.clone(),
        PublisherConfig::default().with_topic("records"),
    );

    let store = Arc::new(InMemoryRecordStore::new());
    store.seed_item("item-42", "Copper Lamp");
    let cache = Arc::new(InMemoryCacheStore::new());

    let access = DataAccess::new(
        store.clone(),
        cache.clone(),
        Arc::new(publisher),
        DataAccessConfig {
            cache_ttl: Duration::from_secs(10),
            revision: "rev-7".to_string(),
        },
    );

    // Create user "alice" and get back a fresh id.
    let alice = access.create_user("alice").await.unwrap();
    assert_eq!(alice.user_name, "alice");

    // Attach item-42.
    access
        .add_item_to_user(alice.user_id, &"item-42".parse().unwrap())
        .await
        .unwrap();

    // List with an empty cache: served from the store, then cached.
    let views = access.list_user_items(alice.user_id).await.unwrap();
    assert_eq!(
        views,
        vec![ItemView {
            user_name: "alice".to_string(),
            item_name: "Copper Lamp".to_string(),
            item_id: "item-42".to_string(),
        }]
    );

    let cached = cache
        .get(&item_list_key(&alice.user_id))
        .await
        .unwrap()
        .expect("cache populated on miss");
    assert_eq!(cached, serde_json::to_vec(&views).unwrap());

    // All three operations emitted an event for alice.
    handle.shutdown().await;
    let messages = sink.messages();
    assert_eq!(messages.len(), 3);
    for (topic, bytes) in &messages {
        assert_eq!(topic, "records");
        let payload: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(payload["id"], alice.user_id.to_string());
        assert_eq!(payload["revision"], "rev-7");
    }
}

#[tokio::test]
async fn bounded_staleness_window_closes_at_ttl() {
    let (publisher, handle) =
        EventPublisher::spawn(Arc::new(InMemorySink::new()), PublisherConfig::default());

    let store = Arc::new(InMemoryRecordStore::new());
    store.seed_item("item-1", "Map");
    store.seed_item("item-2", "Compass");
    let cache = Arc::new(InMemoryCacheStore::new());

    let access = DataAccess::new(
        store.clone(),
        cache.clone(),
        Arc::new(publisher),
        DataAccessConfig {
            cache_ttl: Duration::from_millis(50),
            revision: String::new(),
        },
    );

    let user = access.create_user("bob").await.unwrap();
    access
        .add_item_to_user(user.user_id, &"item-1".parse().unwrap())
        .await
        .unwrap();

    // Populate the cache, then write behind it.
    let before = access.list_user_items(user.user_id).await.unwrap();
    access
        .add_item_to_user(user.user_id, &"item-2".parse().unwrap())
        .await
        .unwrap();

    // Within the TTL the stale single-item list is served.
    assert_eq!(access.list_user_items(user.user_id).await.unwrap(), before);

    // Past the TTL the new item becomes visible.
    tokio::time::sleep(Duration::from_millis(80)).await;
    let after = access.list_user_items(user.user_id).await.unwrap();
    assert_eq!(after.len(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn strict_write_policy_applies_through_the_orchestrator() {
    let (publisher, handle) =
        EventPublisher::spawn(Arc::new(InMemorySink::new()), PublisherConfig::default());

    let store = Arc::new(InMemoryRecordStore::with_policy(WritePolicy::strict()));
    store.seed_item("item-1", "Map");

    let access = DataAccess::new(
        store,
        Arc::new(InMemoryCacheStore::new()),
        Arc::new(publisher),
        DataAccessConfig::default(),
    );

    let user = access.create_user("carol").await.unwrap();
    let item = "item-1".parse().unwrap();
    access.add_item_to_user(user.user_id, &item).await.unwrap();

    // Second attach of the same pair is rejected, surfaced opaquely.
    assert!(access.add_item_to_user(user.user_id, &item).await.is_err());

    handle.shutdown().await;
}
