//! Network-facing interfaces of the service layer.
//!
//! The engines never touch sockets. They talk to the host's connection
//! manager through [`ConnectionManager`], always against a snapshot of the
//! peer list, and push typed [`NetMessage`]s that the host frames and
//! writes. `push` reports whether the peer was still connected, which is
//! what lets callers evict disconnected participants with `retain`.

pub mod fulfilled;

pub use fulfilled::FulfilledRequestTracker;

use keel_messages::{Inventory, NetMessage, PeerAddr};
use serde::{Deserialize, Serialize};

/// Host-assigned peer identifier, stable for the life of a connection.
pub type PeerId = u64;

/// Misbehavior penalty for protocol violations that warrant banning on
/// accumulation: bad signatures, invalid object data, repeated full syncs,
/// out-of-range timestamps.
pub const MISBEHAVIOR_PENALTY: u32 = 20;

/// A snapshot of one peer connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: PeerId,
    pub addr: PeerAddr,
    pub version: u32,
    pub inbound: bool,
    /// Short-lived outbound masternode connection; excluded from vote
    /// solicitation to avoid amplification.
    pub masternode_conn: bool,
}

impl PeerInfo {
    pub fn new(id: PeerId, addr: PeerAddr, version: u32) -> Self {
        Self {
            id,
            addr,
            version,
            inbound: false,
            masternode_conn: false,
        }
    }
}

/// The host's connection manager, as seen by the engines.
pub trait ConnectionManager: Send + Sync {
    /// Queue a message for one peer. Returns `false` if the peer is gone.
    fn push(&self, peer: &PeerAddr, msg: NetMessage) -> bool;

    /// Flood a message to every connected peer at or above `min_proto`.
    fn relay(&self, msg: NetMessage, min_proto: u32);

    /// Announce an inventory item to every peer at or above `min_proto`.
    fn relay_inv(&self, inv: Inventory, min_proto: u32);

    /// Copy of the current peer list. Iterate the copy, never the live
    /// set.
    fn peer_snapshot(&self) -> Vec<PeerInfo>;

    /// Raise a peer's misbehavior score.
    fn misbehaving(&self, peer: PeerId, score: u32);
}
