//! Event sink adapters
//!
//! - [`TracingEventSink`] - Logs every event at debug level
//! - [`BroadcastEventSink`] - Fans events out to any number of async
//!   subscribers over a `tokio::sync::broadcast` channel

use tokio::sync::broadcast;
use tracing::debug;

use paysync_core::ports::{IEventSink, SyncEvent};

/// Logs events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl IEventSink for TracingEventSink {
    fn publish(&self, event: SyncEvent) {
        debug!(event = ?event, "Sync event");
    }
}

/// Publishes events on a broadcast channel
///
/// Events sent while nobody is subscribed are dropped. A subscriber that
/// falls more than `capacity` events behind skips the oldest ones.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<SyncEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }
}

impl IEventSink for BroadcastEventSink {
    fn publish(&self, event: SyncEvent) {
        // Err only means there are no receivers
        let _ = self.sender.send(event);
    }
}
