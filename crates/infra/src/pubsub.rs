//! Redis pub/sub-backed event sink.
//!
//! Note: Redis pub/sub is not durable (messages are dropped if no subscriber
//! is listening). That matches the publisher's at-most-once contract; a
//! durable broker would slot in behind the same [`EventSink`] seam.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use packrat_events::{EventSink, SinkError};

/// Publishes event payloads to a Redis channel named by the topic.
#[derive(Clone)]
pub struct RedisEventSink {
    connection: ConnectionManager,
}

impl RedisEventSink {
    /// Wrap an existing connection manager (shared with the cache adapter).
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Open a dedicated connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, SinkError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| SinkError::Connection(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl EventSink for RedisEventSink {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), SinkError> {
        let mut conn = self.connection.clone();
        let _receivers: i64 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;
        Ok(())
    }
}
