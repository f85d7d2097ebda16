//! Non-blocking snapshot fan-out
//!
//! The tick hands each snapshot to a bounded `tokio::sync::broadcast` channel.
//! Publishing never waits: with no subscribers the snapshot is dropped, and a
//! subscriber that falls more than `capacity` snapshots behind skips ahead to
//! the newest ones (`RecvError::Lagged`).

use log::trace;
use shared::WorldSnapshot;
use std::sync::Arc;
use tokio::sync::broadcast;

pub type SharedSnapshot = Arc<WorldSnapshot>;

#[derive(Debug, Clone)]
pub struct SnapshotBroadcaster {
    sender: broadcast::Sender<SharedSnapshot>,
}

impl SnapshotBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Hands a snapshot to all current subscribers and returns how many there were.
    pub fn publish(&self, snapshot: WorldSnapshot) -> usize {
        match self.sender.send(Arc::new(snapshot)) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("No snapshot subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SharedSnapshot> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
