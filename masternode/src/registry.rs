//! The masternode registry interface.
//!
//! The host node maintains the authenticated masternode list (staked
//! collateral, proven ownership, liveness). The service layer only reads
//! it: identity lookups for signature checks, the active count for quorum
//! math, and vote bookkeeping callbacks.

use keel_messages::PeerAddr;
use keel_types::{ObjectHash, Outpoint, PublicKey};
use serde::{Deserialize, Serialize};

/// What the registry knows about one masternode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasternodeInfo {
    pub addr: PeerAddr,
    pub pubkey: PublicKey,
}

/// The host's registry of authenticated masternodes.
pub trait MasternodeRegistry: Send + Sync {
    /// Identity of the masternode staked on `outpoint`, if known.
    fn lookup(&self, outpoint: &Outpoint) -> Option<MasternodeInfo>;

    /// Whether `outpoint` is a known masternode.
    fn has(&self, outpoint: &Outpoint) -> bool;

    /// Number of enabled masternodes, the quorum denominator.
    fn active_count(&self) -> usize;

    /// Record that a masternode voted on an object. Returns `false` when
    /// the registry refuses the vote (e.g. the masternode vanished).
    fn record_vote(&self, outpoint: &Outpoint, parent: &ObjectHash) -> bool;

    /// Forget all references to a governance object being erased.
    fn remove_object_references(&self, hash: &ObjectHash);

    /// Ask `peer` for the announcement of an unknown masternode.
    fn ask_for(&self, peer: &PeerAddr, outpoint: &Outpoint);

    /// Hashes of objects whose masternodes changed since the last call;
    /// their cached votes need revalidation.
    fn take_dirty_object_hashes(&self) -> Vec<ObjectHash>;
}
