//! Trigger sub-manager.
//!
//! Superblock triggers get an extra layer of tracking: each must decode to
//! a well-formed trigger payload scheduling a plausible future height, and
//! triggers whose event height has passed are swept so the store can latch
//! them expired.

use crate::object::StoredObject;
use keel_messages::ObjectPayload;
use keel_types::{ObjectHash, ProtocolParams};
use std::collections::BTreeMap;
use tracing::debug;

/// Tracks registered superblock triggers by object hash.
#[derive(Clone, Debug, Default)]
pub struct TriggerManager {
    /// hash → scheduled event height.
    triggers: BTreeMap<ObjectHash, u32>,
}

impl TriggerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger object. Returns `false` when the payload is
    /// malformed or schedules an implausible height; the caller flags
    /// the object for lazy deletion.
    pub fn add_new_trigger(
        &mut self,
        hash: ObjectHash,
        stored: &StoredObject,
        current_height: u32,
        params: &ProtocolParams,
    ) -> bool {
        if self.triggers.contains_key(&hash) {
            return true;
        }
        let Some(ObjectPayload::Trigger(payload)) = stored.object.payload() else {
            return false;
        };
        if !payload.is_well_formed() {
            return false;
        }
        // must schedule within the next two cycles, not the past
        let horizon = current_height + 2 * params.superblock_cycle_blocks;
        if payload.event_height <= current_height || payload.event_height > horizon {
            debug!(
                event_height = payload.event_height,
                current_height, "rejecting trigger outside scheduling window"
            );
            return false;
        }
        self.triggers.insert(hash, payload.event_height);
        true
    }

    pub fn contains(&self, hash: &ObjectHash) -> bool {
        self.triggers.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Drop triggers whose event height has passed, returning their hashes
    /// so the store can latch the objects expired.
    pub fn clean_and_remove(&mut self, current_height: u32) -> Vec<ObjectHash> {
        let stale: Vec<ObjectHash> = self
            .triggers
            .iter()
            .filter(|(_, event_height)| **event_height < current_height)
            .map(|(hash, _)| *hash)
            .collect();
        for hash in &stale {
            self.triggers.remove(hash);
        }
        stale
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }
}
