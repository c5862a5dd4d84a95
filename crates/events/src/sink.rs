//! Broker seam for event emission.
//!
//! A sink is the transport: it takes a topic and an opaque byte payload and
//! delivers them to a broker. It makes no delivery guarantee beyond what the
//! broker itself provides; durability and retries are explicitly out of scope
//! (the publisher's contract is at-most-once).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Error from the underlying broker transport.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The broker was unreachable or rejected the connection.
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// The broker accepted the connection but refused the publish.
    #[error("broker rejected publish: {0}")]
    Rejected(String),
}

/// Topic-addressed byte-payload publish.
///
/// Implementations must be safe for concurrent use; the publisher's worker
/// pool calls `publish` from several tasks at once.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), SinkError>;
}

#[async_trait]
impl<S> EventSink for Arc<S>
where
    S: EventSink + ?Sized,
{
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), SinkError> {
        (**self).publish(topic, payload).await
    }
}
