//! The local list of mixing queues seen on the network.

use keel_messages::CoinJoinQueue;
use keel_types::Outpoint;
use tracing::debug;

/// What a gossiped queue turned out to be relative to the local list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueObservation {
    /// Same masternode, same status — seen before.
    Duplicate,
    /// Same masternode, newer status/height — stored copy updated.
    Updated,
    /// First sighting of this masternode's queue.
    New,
}

/// Mixing queues currently known, ours and everyone else's.
#[derive(Default)]
pub struct QueuePool {
    queues: Vec<CoinJoinQueue>,
}

impl QueuePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, queue: CoinJoinQueue) {
        self.queues.push(queue);
    }

    /// Fold a gossiped queue into the list. Each queue is processed once;
    /// a higher status or height on a known queue updates the stored copy
    /// so duplicates stay identifiable.
    pub fn observe(&mut self, queue: &CoinJoinQueue) -> QueueObservation {
        for stored in self.queues.iter_mut() {
            if stored.masternode_outpoint != queue.masternode_outpoint {
                continue;
            }
            if stored.status == queue.status {
                return QueueObservation::Duplicate;
            }
            debug!(queue = %queue, open = queue.is_open(), "queue status changed");
            if queue.status > stored.status {
                stored.status = queue.status;
            }
            if queue.height > stored.height {
                stored.height = queue.height;
            }
            return QueueObservation::Updated;
        }
        QueueObservation::New
    }

    /// Whether a masternode still has an advertisement in the list.
    pub fn has_queue_from(&self, outpoint: &Outpoint) -> bool {
        self.queues
            .iter()
            .any(|queue| queue.masternode_outpoint == *outpoint)
    }

    /// Drop queues past their block TTL.
    pub fn check_expired(&mut self, current_height: u32, ttl_blocks: u32) {
        self.queues.retain(|queue| {
            let expired = queue.is_expired(current_height, ttl_blocks);
            if expired {
                debug!(queue = %queue, "removing expired queue");
            }
            !expired
        });
    }

    /// Next open queue a client hasn't tried yet.
    pub fn next_untried(&mut self) -> Option<CoinJoinQueue> {
        for queue in self.queues.iter_mut() {
            if queue.tried || !queue.is_open() {
                continue;
            }
            queue.tried = true;
            return Some(queue.clone());
        }
        None
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}
