//! `packrat-infra` — stores, cache, and the data-access orchestration.
//!
//! This crate composes the two external collaborators (transactional Postgres
//! store, TTL'd Redis cache) into the three domain operations, and hosts the
//! Redis-backed event sink. The in-memory implementations next to each
//! adapter exist for tests and dev wiring.

pub mod access;
pub mod cache;
pub mod config;
pub mod pubsub;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use access::{AccessError, DataAccess, DataAccessConfig};
pub use cache::{CacheError, CacheStore, InMemoryCacheStore, RedisCacheStore};
pub use config::{AppConfig, ConfigError};
pub use pubsub::RedisEventSink;
pub use store::{
    InMemoryRecordStore, PostgresRecordStore, RecordStore, StoreError, WritePolicy,
};
