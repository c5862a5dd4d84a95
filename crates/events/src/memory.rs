//! In-memory sink for tests/dev.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::sink::{EventSink, SinkError};

/// In-memory recording sink.
///
/// - No IO
/// - Records every delivered `(topic, payload)` pair
/// - Can be built failing (every publish errors) or gated (publishes block
///   until [`InMemorySink::release`] grants permits), which is how tests
///   observe that the async path never waits on the broker
#[derive(Debug)]
pub struct InMemorySink {
    messages: Mutex<Vec<(String, Vec<u8>)>>,
    attempts: AtomicU64,
    fail: bool,
    gate: Option<Arc<Semaphore>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            attempts: AtomicU64::new(0),
            fail: false,
            gate: None,
        }
    }

    /// A sink whose every publish fails with a connection error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// A sink that holds each publish until a permit is released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Allow `n` gated publishes to proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Everything successfully delivered so far.
    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().unwrap().clone()
    }

    /// Publish attempts, including failed ones.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for InMemorySink {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| SinkError::Connection("gate closed".to_string()))?;
            permit.forget();
        }

        if self.fail {
            return Err(SinkError::Connection("simulated broker failure".to_string()));
        }

        self.messages
            .lock()
            .map_err(|_| SinkError::Connection("sink poisoned".to_string()))?
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}
