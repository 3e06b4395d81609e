//! Wire payloads for Keel node-to-node communication.
//!
//! The wire envelope (framing, handshake, peer lifecycle) is the host
//! node's business. This crate defines the payloads that travel inside an
//! established channel and the tagged union [`NetMessage`] the node
//! dispatches on: decoded once at the boundary, matched on by the engines.

pub mod bloom;
pub mod governance;
pub mod mixing;

pub use bloom::BloomFilter;
pub use governance::{
    GovObjectType, GovernanceObject, GovernanceVote, ObjectPayload, ProposalPayload,
    TriggerPayload, VoteOutcome, VoteSignal,
};
pub use mixing::{CoinJoinEntry, CoinJoinQueue, FinalTxBroadcast, PoolMessage, PoolState, PoolStatusUpdate};

use keel_transactions::PartialTransaction;
use keel_types::{Denom, ObjectHash, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reject code for peers running an obsolete protocol version.
pub const REJECT_OBSOLETE: u8 = 0x11;

/// A peer's network address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr {
    pub ip: String,
    pub port: u16,
}

impl PeerAddr {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// An inventory announcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inventory {
    Transaction(TxHash),
    GovernanceObject(ObjectHash),
    GovernanceVote(ObjectHash),
}

/// Which item kind a sync-status count summarizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncKind {
    Objects,
    Votes,
}

/// Every message the service layer consumes or produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NetMessage {
    // ── mixing, inbound ────────────────────────────────────────────────
    MixAccept {
        denom: Denom,
    },
    MixQueue(CoinJoinQueue),
    MixTxIn(CoinJoinEntry),
    MixSignFinal(PartialTransaction),

    // ── mixing, outbound ───────────────────────────────────────────────
    MixStatusUpdate {
        session_id: u32,
        state: PoolState,
        entry_count: u32,
        update: PoolStatusUpdate,
        message: PoolMessage,
    },
    MixFinalTx(FinalTxBroadcast),
    MixComplete {
        session_id: u32,
        message: PoolMessage,
    },

    // ── governance, both directions ────────────────────────────────────
    GovernanceSync {
        hash: ObjectHash,
        filter: Option<BloomFilter>,
    },
    GovernanceObject(GovernanceObject),
    GovernanceVote(GovernanceVote),
    SyncStatusCount {
        kind: SyncKind,
        count: u32,
    },

    // ── shared ─────────────────────────────────────────────────────────
    Inv(Inventory),
    Reject {
        command: String,
        code: u8,
        reason: String,
    },
}

impl NetMessage {
    /// The wire tag for this message.
    pub fn command(&self) -> &'static str {
        match self {
            NetMessage::MixAccept { .. } => "cjaccept",
            NetMessage::MixQueue(_) => "cjqueue",
            NetMessage::MixTxIn(_) => "cjtxin",
            NetMessage::MixSignFinal(_) => "cjsignfinaltx",
            NetMessage::MixStatusUpdate { .. } => "cjstatusupdate",
            NetMessage::MixFinalTx(_) => "cjfinaltx",
            NetMessage::MixComplete { .. } => "cjcomplete",
            NetMessage::GovernanceSync { .. } => "mngovernancesync",
            NetMessage::GovernanceObject(_) => "mngovernanceobject",
            NetMessage::GovernanceVote(_) => "mngovernanceobjectvote",
            NetMessage::SyncStatusCount { .. } => "syncstatuscount",
            NetMessage::Inv(_) => "inv",
            NetMessage::Reject { .. } => "reject",
        }
    }

    /// Whether the mixing coordinator handles this message.
    pub fn is_mixing(&self) -> bool {
        matches!(
            self,
            NetMessage::MixAccept { .. }
                | NetMessage::MixQueue(_)
                | NetMessage::MixTxIn(_)
                | NetMessage::MixSignFinal(_)
        )
    }

    /// Whether the governance engine handles this message.
    pub fn is_governance(&self) -> bool {
        matches!(
            self,
            NetMessage::GovernanceSync { .. }
                | NetMessage::GovernanceObject(_)
                | NetMessage::GovernanceVote(_)
        )
    }
}
