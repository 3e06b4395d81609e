//! Nullable masternode registry.

use keel_masternode::{MasternodeInfo, MasternodeRegistry};
use keel_messages::PeerAddr;
use keel_types::{ObjectHash, Outpoint, PublicKey};
use std::collections::HashMap;
use std::sync::Mutex;

/// A registry whose contents the test controls, recording every callback
/// the engines make.
pub struct NullRegistry {
    masternodes: Mutex<HashMap<Outpoint, MasternodeInfo>>,
    recorded_votes: Mutex<Vec<(Outpoint, ObjectHash)>>,
    removed_objects: Mutex<Vec<ObjectHash>>,
    asked_for: Mutex<Vec<(PeerAddr, Outpoint)>>,
    dirty_hashes: Mutex<Vec<ObjectHash>>,
    refuse_votes: Mutex<bool>,
}

impl NullRegistry {
    pub fn new() -> Self {
        Self {
            masternodes: Mutex::new(HashMap::new()),
            recorded_votes: Mutex::new(Vec::new()),
            removed_objects: Mutex::new(Vec::new()),
            asked_for: Mutex::new(Vec::new()),
            dirty_hashes: Mutex::new(Vec::new()),
            refuse_votes: Mutex::new(false),
        }
    }

    pub fn add(&self, outpoint: Outpoint, addr: PeerAddr, pubkey: PublicKey) {
        self.masternodes
            .lock()
            .unwrap()
            .insert(outpoint, MasternodeInfo { addr, pubkey });
    }

    pub fn remove(&self, outpoint: &Outpoint) {
        self.masternodes.lock().unwrap().remove(outpoint);
    }

    /// Make `record_vote` fail, as when the masternode vanished mid-vote.
    pub fn set_refuse_votes(&self, refuse: bool) {
        *self.refuse_votes.lock().unwrap() = refuse;
    }

    pub fn mark_dirty(&self, hash: ObjectHash) {
        self.dirty_hashes.lock().unwrap().push(hash);
    }

    pub fn recorded_votes(&self) -> Vec<(Outpoint, ObjectHash)> {
        self.recorded_votes.lock().unwrap().clone()
    }

    pub fn removed_objects(&self) -> Vec<ObjectHash> {
        self.removed_objects.lock().unwrap().clone()
    }

    pub fn asked_for(&self) -> Vec<(PeerAddr, Outpoint)> {
        self.asked_for.lock().unwrap().clone()
    }
}

impl Default for NullRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MasternodeRegistry for NullRegistry {
    fn lookup(&self, outpoint: &Outpoint) -> Option<MasternodeInfo> {
        self.masternodes.lock().unwrap().get(outpoint).cloned()
    }

    fn has(&self, outpoint: &Outpoint) -> bool {
        self.masternodes.lock().unwrap().contains_key(outpoint)
    }

    fn active_count(&self) -> usize {
        self.masternodes.lock().unwrap().len()
    }

    fn record_vote(&self, outpoint: &Outpoint, parent: &ObjectHash) -> bool {
        if *self.refuse_votes.lock().unwrap() {
            return false;
        }
        self.recorded_votes
            .lock()
            .unwrap()
            .push((*outpoint, *parent));
        true
    }

    fn remove_object_references(&self, hash: &ObjectHash) {
        self.removed_objects.lock().unwrap().push(*hash);
    }

    fn ask_for(&self, peer: &PeerAddr, outpoint: &Outpoint) {
        self.asked_for
            .lock()
            .unwrap()
            .push((peer.clone(), *outpoint));
    }

    fn take_dirty_object_hashes(&self) -> Vec<ObjectHash> {
        std::mem::take(&mut *self.dirty_hashes.lock().unwrap())
    }
}
