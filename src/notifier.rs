//! Store-change notifications.
//!
//! A notification only tells listeners that something changed; they are
//! expected to re-fetch and re-aggregate rather than apply deltas.

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreChange {
    EventAppended { id: u64 },
    EventUpdated { id: u64 },
    EventDeleted { id: u64 },
    AnnouncementUpdated,
    RosterChanged,
    /// Sent to a listener that fell behind and missed notifications.
    Resync,
}

#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<StoreChange>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, change: StoreChange) {
        debug!(?change, "Publishing store change");
        // No listeners is fine.
        let _ = self.sender.send(change);
    }

    /// Raw receiver, for consumers that drive their own loop (the SSE stream).
    pub fn receiver(&self) -> broadcast::Receiver<StoreChange> {
        self.sender.subscribe()
    }

    /// Runs `on_change` for every notification until the returned handle is
    /// cancelled or dropped. Must be called inside a Tokio runtime.
    pub fn subscribe<F>(&self, mut on_change: F) -> Subscription
    where
        F: FnMut(StoreChange) + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(change) => on_change(change),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Subscriber lagged behind store changes");
                        on_change(StoreChange::Resync);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription { task }
    }
}

/// Live subscription; delivery stops when this is cancelled or dropped.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
