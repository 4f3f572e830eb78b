//! Delta Sink
//!
//! Cooperative-cancellation wrapper over the output channel. Once the
//! consumer disconnects, the sink goes quiet permanently: in-flight
//! upstream work may continue, but nothing further is delivered.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use agent_gateway_core::AgentDelta;

/// Ordered, cancellable delta output for one run.
pub struct DeltaSink {
    tx: mpsc::Sender<AgentDelta>,
    cancelled: AtomicBool,
}

impl DeltaSink {
    pub fn new(tx: mpsc::Sender<AgentDelta>) -> Self {
        Self {
            tx,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Emit one delta. A failed send marks the sink cancelled and all
    /// subsequent emits become no-ops.
    pub async fn emit(&self, delta: AgentDelta) {
        if self.is_cancelled() {
            return;
        }
        if self.tx.send(delta).await.is_err() {
            self.cancelled.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
