//! `packrat-events` — best-effort event emission.
//!
//! This crate owns the fire-and-forget publish path: a broker-agnostic
//! [`EventSink`] seam, and an [`EventPublisher`] that serializes payloads and
//! either publishes inline or hands them to a bounded background worker pool.
//! Delivery is at-most-once; failures are logged, never retried, and never
//! surfaced to the operation that triggered the event.

pub mod memory;
pub mod publisher;
pub mod sink;

pub use memory::InMemorySink;
pub use publisher::{
    EventPublisher, PublishError, PublishMode, PublisherConfig, PublisherHandle, PublisherStats,
};
pub use sink::{EventSink, SinkError};
