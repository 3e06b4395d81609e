//! Nullable connection manager — records every push, relay and penalty.

use keel_messages::{Inventory, NetMessage, PeerAddr};
use keel_network::{ConnectionManager, PeerId, PeerInfo};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub struct NullConnman {
    peers: Mutex<Vec<PeerInfo>>,
    connected: Mutex<HashSet<PeerAddr>>,
    pushed: Mutex<Vec<(PeerAddr, NetMessage)>>,
    relayed: Mutex<Vec<(NetMessage, u32)>>,
    relayed_invs: Mutex<Vec<(Inventory, u32)>>,
    penalties: Mutex<HashMap<PeerId, u32>>,
}

impl NullConnman {
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(Vec::new()),
            connected: Mutex::new(HashSet::new()),
            pushed: Mutex::new(Vec::new()),
            relayed: Mutex::new(Vec::new()),
            relayed_invs: Mutex::new(Vec::new()),
            penalties: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connected peer; it shows up in snapshots and accepts
    /// pushes.
    pub fn connect(&self, info: PeerInfo) {
        self.connected.lock().unwrap().insert(info.addr.clone());
        self.peers.lock().unwrap().push(info);
    }

    /// Drop a peer; subsequent pushes to it fail.
    pub fn disconnect(&self, addr: &PeerAddr) {
        self.connected.lock().unwrap().remove(addr);
        self.peers.lock().unwrap().retain(|p| p.addr != *addr);
    }

    pub fn pushed(&self) -> Vec<(PeerAddr, NetMessage)> {
        self.pushed.lock().unwrap().clone()
    }

    /// Pushes to one peer, in order.
    pub fn pushed_to(&self, addr: &PeerAddr) -> Vec<NetMessage> {
        self.pushed
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == addr)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn relayed(&self) -> Vec<(NetMessage, u32)> {
        self.relayed.lock().unwrap().clone()
    }

    pub fn relayed_invs(&self) -> Vec<(Inventory, u32)> {
        self.relayed_invs.lock().unwrap().clone()
    }

    pub fn penalty(&self, peer: PeerId) -> u32 {
        self.penalties
            .lock()
            .unwrap()
            .get(&peer)
            .copied()
            .unwrap_or(0)
    }

    pub fn clear_traffic(&self) {
        self.pushed.lock().unwrap().clear();
        self.relayed.lock().unwrap().clear();
        self.relayed_invs.lock().unwrap().clear();
    }
}

impl Default for NullConnman {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager for NullConnman {
    fn push(&self, peer: &PeerAddr, msg: NetMessage) -> bool {
        if !self.connected.lock().unwrap().contains(peer) {
            return false;
        }
        self.pushed.lock().unwrap().push((peer.clone(), msg));
        true
    }

    fn relay(&self, msg: NetMessage, min_proto: u32) {
        self.relayed.lock().unwrap().push((msg, min_proto));
    }

    fn relay_inv(&self, inv: Inventory, min_proto: u32) {
        self.relayed_invs.lock().unwrap().push((inv, min_proto));
    }

    fn peer_snapshot(&self) -> Vec<PeerInfo> {
        self.peers.lock().unwrap().clone()
    }

    fn misbehaving(&self, peer: PeerId, score: u32) {
        *self.penalties.lock().unwrap().entry(peer).or_insert(0) += score;
    }
}
