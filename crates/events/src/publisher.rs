//! Fire-and-forget event publisher with a bounded background worker pool.
//!
//! The async path is deliberately *not* "spawn a task per publish": payloads
//! go onto a bounded queue drained by a small fixed pool of workers, so the
//! amount of detached work is bounded and observable. When the queue is full
//! the payload is dropped and counted rather than blocking the caller.
//!
//! Detached work is exempt from the initiating caller's cancellation: once a
//! payload is queued, the request that produced it can complete (or be
//! cancelled) without affecting delivery.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sink::EventSink;

/// Publish failure.
///
/// These reach the immediate caller of [`EventPublisher::publish`] only; the
/// domain operations that trigger events log and absorb them.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The payload could not be serialized to bytes.
    #[error("event serialization failed: {0}")]
    Serialize(String),

    /// The broker publish itself failed (sync mode only).
    #[error("broker publish failed: {0}")]
    Sink(String),

    /// The background queue has been shut down.
    #[error("publish queue closed")]
    QueueClosed,
}

/// Whether to wait for broker acknowledgment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PublishMode {
    /// Block until the broker acknowledges (or fails).
    Sync,
    /// Enqueue for a background worker and return immediately.
    Async,
}

/// Publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Topic events are published to. An empty topic disables publishing
    /// entirely: `publish` becomes a successful no-op.
    pub topic: String,
    /// Number of background worker tasks.
    pub workers: usize,
    /// Capacity of the pending-publish queue.
    pub queue_capacity: usize,
    /// How often an idle worker re-checks the queue.
    pub poll_interval: Duration,
    /// Name for logging.
    pub name: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            workers: 2,
            queue_capacity: 256,
            poll_interval: Duration::from_millis(20),
            name: "event-publisher".to_string(),
        }
    }
}

impl PublisherConfig {
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Publisher runtime statistics.
///
/// The counters are cumulative; `queue_depth` is a point-in-time snapshot of
/// how many payloads are waiting for a worker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublisherStats {
    pub enqueued: u64,
    pub published: u64,
    pub failed: u64,
    pub dropped: u64,
    pub queue_depth: usize,
}

/// Handle to control the running worker pool.
///
/// Dropping the handle without calling [`PublisherHandle::shutdown`] leaves
/// the workers running for the life of the runtime.
pub struct PublisherHandle {
    shutdown: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl PublisherHandle {
    /// Request graceful shutdown and wait for the workers.
    ///
    /// Already-queued payloads are drained and published before the workers
    /// exit; payloads enqueued after this call may be dropped.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for join in self.joins {
            let _ = join.await;
        }
    }
}

/// Serializes payloads and dispatches them to an [`EventSink`].
pub struct EventPublisher {
    topic: String,
    sink: Arc<dyn EventSink>,
    queue: mpsc::Sender<Vec<u8>>,
    stats: Arc<Mutex<PublisherStats>>,
}

impl EventPublisher {
    /// Spawn the worker pool and return the publisher plus its control handle.
    pub fn spawn(sink: Arc<dyn EventSink>, config: PublisherConfig) -> (Self, PublisherHandle) {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(PublisherStats::default()));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let mut joins = Vec::with_capacity(config.workers.max(1));
        for n in 0..config.workers.max(1) {
            joins.push(tokio::spawn(worker_loop(WorkerContext {
                worker: n,
                name: config.name.clone(),
                topic: config.topic.clone(),
                sink: sink.clone(),
                queue: rx.clone(),
                shutdown: shutdown_rx.clone(),
                stats: stats.clone(),
                poll_interval: config.poll_interval,
            })));
        }

        let publisher = Self {
            topic: config.topic,
            sink,
            queue: tx,
            stats,
        };
        let handle = PublisherHandle {
            shutdown: shutdown_tx,
            joins,
        };
        (publisher, handle)
    }

    /// Publish a payload to the configured topic.
    ///
    /// An empty topic makes this a deliberate no-op returning success, which
    /// is how emission is toggled globally without branching at call sites.
    ///
    /// In [`PublishMode::Async`] the payload is queued and this returns before
    /// any broker traffic happens; a full queue drops the payload (counted in
    /// [`PublisherStats::dropped`]) rather than blocking.
    pub async fn publish<P>(&self, payload: &P, mode: PublishMode) -> Result<(), PublishError>
    where
        P: Serialize + ?Sized,
    {
        if self.topic.is_empty() {
            return Ok(());
        }

        let bytes =
            serde_json::to_vec(payload).map_err(|e| PublishError::Serialize(e.to_string()))?;

        match mode {
            PublishMode::Sync => match self.sink.publish(&self.topic, &bytes).await {
                Ok(()) => {
                    self.stats.lock().unwrap().published += 1;
                    Ok(())
                }
                Err(e) => {
                    self.stats.lock().unwrap().failed += 1;
                    Err(PublishError::Sink(e.to_string()))
                }
            },
            PublishMode::Async => match self.queue.try_send(bytes) {
                Ok(()) => {
                    self.stats.lock().unwrap().enqueued += 1;
                    Ok(())
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Backpressure policy: drop, count, keep the caller moving.
                    self.stats.lock().unwrap().dropped += 1;
                    warn!(topic = %self.topic, "publish queue full, dropping event");
                    Ok(())
                }
                Err(mpsc::error::TrySendError::Closed(_)) => Err(PublishError::QueueClosed),
            },
        }
    }

    /// Current counters plus a snapshot of the pending-queue depth.
    pub fn stats(&self) -> PublisherStats {
        let mut stats = self.stats.lock().unwrap().clone();
        stats.queue_depth = self.queue.max_capacity() - self.queue.capacity();
        stats
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

struct WorkerContext {
    worker: usize,
    name: String,
    topic: String,
    sink: Arc<dyn EventSink>,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<Vec<u8>>>>,
    shutdown: watch::Receiver<bool>,
    stats: Arc<Mutex<PublisherStats>>,
    poll_interval: Duration,
}

async fn worker_loop(ctx: WorkerContext) {
    debug!(publisher = %ctx.name, worker = ctx.worker, "publish worker started");

    loop {
        // Pull without holding the queue lock across the broker call.
        let next = { ctx.queue.lock().await.try_recv() };

        match next {
            Ok(bytes) => {
                match ctx.sink.publish(&ctx.topic, &bytes).await {
                    Ok(()) => {
                        ctx.stats.lock().unwrap().published += 1;
                    }
                    Err(e) => {
                        // At-most-once: log, count, move on. No retry.
                        ctx.stats.lock().unwrap().failed += 1;
                        warn!(
                            publisher = %ctx.name,
                            worker = ctx.worker,
                            topic = %ctx.topic,
                            error = %e,
                            "async publish failed"
                        );
                    }
                }
            }
            Err(mpsc::error::TryRecvError::Empty) => {
                if *ctx.shutdown.borrow() {
                    break;
                }
                tokio::time::sleep(ctx.poll_interval).await;
            }
            Err(mpsc::error::TryRecvError::Disconnected) => break,
        }
    }

    info!(publisher = %ctx.name, worker = ctx.worker, "publish worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySink;

    fn config(topic: &str) -> PublisherConfig {
        PublisherConfig::default()
            .with_topic(topic)
            .with_workers(1)
            .with_name("test-publisher")
    }

    #[tokio::test]
    async fn empty_topic_is_a_successful_no_op() {
        let sink = Arc::new(InMemorySink::new());
        let (publisher, handle) = EventPublisher::spawn(sink.clone(), config(""));

        let payload = serde_json::json!({"id": "u-1", "revision": "r-1"});
        publisher.publish(&payload, PublishMode::Sync).await.unwrap();
        publisher.publish(&payload, PublishMode::Async).await.unwrap();

        handle.shutdown().await;
        assert_eq!(sink.messages().len(), 0);
        assert_eq!(publisher.stats().enqueued, 0);
    }

    #[tokio::test]
    async fn sync_publish_reaches_the_sink() {
        let sink = Arc::new(InMemorySink::new());
        let (publisher, handle) = EventPublisher::spawn(sink.clone(), config("t"));

        let payload = serde_json::json!({"id": "u-1"});
        publisher.publish(&payload, PublishMode::Sync).await.unwrap();

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "t");
        let value: serde_json::Value = serde_json::from_slice(&messages[0].1).unwrap();
        assert_eq!(value["id"], "u-1");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn sync_publish_surfaces_sink_failure_to_immediate_caller() {
        let sink = Arc::new(InMemorySink::failing());
        let (publisher, handle) = EventPublisher::spawn(sink, config("t"));

        let payload = serde_json::json!({});
        let err = publisher
            .publish(&payload, PublishMode::Sync)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Sink(_)));
        assert_eq!(publisher.stats().failed, 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn async_publish_returns_before_broker_ack() {
        let sink = Arc::new(InMemorySink::gated());
        let (publisher, handle) = EventPublisher::spawn(sink.clone(), config("t"));

        // The sink will not acknowledge until released; publish must still
        // return immediately.
        let payload = serde_json::json!({"id": "u-1"});
        publisher
            .publish(&payload, PublishMode::Async)
            .await
            .unwrap();
        assert_eq!(sink.messages().len(), 0);
        assert_eq!(publisher.stats().enqueued, 1);

        sink.release(1);
        handle.shutdown().await;
        assert_eq!(sink.messages().len(), 1);
        assert_eq!(publisher.stats().published, 1);
    }

    #[tokio::test]
    async fn async_publish_failures_are_counted_not_retried() {
        let sink = Arc::new(InMemorySink::failing());
        let (publisher, handle) = EventPublisher::spawn(sink.clone(), config("t"));

        let payload = serde_json::json!({});
        publisher
            .publish(&payload, PublishMode::Async)
            .await
            .unwrap();

        handle.shutdown().await;
        let stats = publisher.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.published, 0);
        assert_eq!(sink.attempts(), 1);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let sink = Arc::new(InMemorySink::gated());
        let cfg = config("t").with_queue_capacity(1);
        let (publisher, handle) = EventPublisher::spawn(sink.clone(), cfg);

        let payload = serde_json::json!({"n": 1});
        // Capacity 1 and a gated sink: the second enqueue may land after the
        // worker already pulled the first, so push until a drop is observed.
        for _ in 0..8 {
            publisher
                .publish(&payload, PublishMode::Async)
                .await
                .unwrap();
        }
        assert!(publisher.stats().dropped >= 1);

        sink.release(8);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn stats_report_pending_queue_depth() {
        let sink = Arc::new(InMemorySink::gated());
        let cfg = config("t").with_queue_capacity(8);
        let (publisher, handle) = EventPublisher::spawn(sink.clone(), cfg);

        let payload = serde_json::json!({"n": 1});
        for _ in 0..4 {
            publisher
                .publish(&payload, PublishMode::Async)
                .await
                .unwrap();
        }
        // The worker may have pulled one payload and be blocked on the gate;
        // the rest are still sitting in the queue.
        let depth = publisher.stats().queue_depth;
        assert!((3..=4).contains(&depth), "depth was {depth}");

        sink.release(4);
        handle.shutdown().await;
        assert_eq!(publisher.stats().queue_depth, 0);
        assert_eq!(publisher.stats().published, 4);
    }

    #[tokio::test]
    async fn shutdown_drains_queued_payloads() {
        let sink = Arc::new(InMemorySink::new());
        let (publisher, handle) = EventPublisher::spawn(sink.clone(), config("t"));

        for n in 0..5 {
            let payload = serde_json::json!({"n": n});
            publisher
                .publish(&payload, PublishMode::Async)
                .await
                .unwrap();
        }

        handle.shutdown().await;
        assert_eq!(sink.messages().len(), 5);
        assert_eq!(publisher.stats().published, 5);
    }
}
