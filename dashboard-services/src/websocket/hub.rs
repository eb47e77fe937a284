//! Broadcast hub for dashboard subscribers
//!
//! Every subscriber owns a bounded FIFO channel. Publishing never waits: a
//! full channel loses that one update, a closed channel is unregistered.

use dashboard_core::DashboardSnapshot;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, trace};

/// Unique identifier for a hub subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// A registered subscriber's receiving end
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Arc<DashboardSnapshot>>,
}

impl Subscription {
    /// Wait for the next snapshot; `None` once the hub has dropped this subscriber
    pub async fn recv(&mut self) -> Option<Arc<DashboardSnapshot>> {
        self.receiver.recv().await
    }
}

/// Outcome of one publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
    pub disconnected: usize,
}

/// Fan-out of snapshots to every current subscriber
pub struct BroadcastHub {
    next_id: AtomicU64,
    subscribers: DashMap<SubscriberId, mpsc::Sender<Arc<DashboardSnapshot>>>,
    buffer: usize,
}

impl BroadcastHub {
    /// Create a hub whose subscriber channels hold `buffer` snapshots
    pub fn new(buffer: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber. Earlier snapshots are not replayed.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, receiver) = mpsc::channel(self.buffer);
        self.subscribers.insert(id, tx);
        info!("{} subscribed ({} total)", id, self.subscribers.len());
        Subscription { id, receiver }
    }

    /// Remove a subscriber; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.remove(&id).is_some() {
            info!("{} unsubscribed ({} remaining)", id, self.subscribers.len());
        }
    }

    /// Offer a snapshot to every subscriber without waiting on any of them
    pub fn publish(&self, snapshot: Arc<DashboardSnapshot>) -> PublishReport {
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for entry in self.subscribers.iter() {
            match entry.value().try_send(Arc::clone(&snapshot)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    trace!("{} is behind, dropping update", entry.key());
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // Removal happens after iteration so no shard lock is re-entered
        for id in closed {
            if self.subscribers.remove(&id).is_some() {
                debug!("{} closed, removed from hub", id);
                report.disconnected += 1;
            }
        }

        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.contains_key(&id)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SUBSCRIBER_BUFFER)
    }
}
