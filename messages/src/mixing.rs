//! Mixing-pool wire types: status codes, queue advertisements, entries,
//! and the signed final-transaction broadcast.

use keel_crypto::{blake2b_256_multi, sign_hash, verify_hash};
use keel_transactions::PartialTransaction;
use keel_types::{Denom, Outpoint, PrivateKey, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pool response codes carried in status updates and completions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolMessage {
    ErrAlreadyHave,
    ErrDenom,
    ErrEntriesFull,
    ErrInvalidOut,
    ErrMnFees,
    ErrInvalidInput,
    ErrFees,
    ErrInvalidTx,
    ErrMaximum,
    ErrMnList,
    ErrMode,
    ErrQueueFull,
    ErrRecent,
    ErrSession,
    ErrMissingTx,
    ErrVersion,
    NoErr,
    Success,
    EntriesAdded,
}

impl PoolMessage {
    /// The user-facing text for this code.
    pub fn description(&self) -> &'static str {
        match self {
            PoolMessage::ErrAlreadyHave => "Already have that input.",
            PoolMessage::ErrDenom => "No matching denominations found for mixing.",
            PoolMessage::ErrEntriesFull => "Entries are full.",
            PoolMessage::ErrInvalidOut => "Not compatible with existing transactions.",
            PoolMessage::ErrMnFees => "Missing or high masternode fees.",
            PoolMessage::ErrInvalidInput => "Input is not valid.",
            PoolMessage::ErrFees => "Included fees too high or too low.",
            PoolMessage::ErrInvalidTx => "Transaction not valid.",
            PoolMessage::ErrMaximum => "Entry exceeds maximum size.",
            PoolMessage::ErrMnList => "Not in the Masternode list.",
            PoolMessage::ErrMode => "Incompatible mode.",
            PoolMessage::ErrQueueFull => "Masternode queue is full.",
            PoolMessage::ErrRecent => "Last mixing session was too recent.",
            PoolMessage::ErrSession => "Session not complete!",
            PoolMessage::ErrMissingTx => "Missing input transaction information.",
            PoolMessage::ErrVersion => "Incompatible version.",
            PoolMessage::NoErr => "No errors detected.",
            PoolMessage::Success => "Transaction created successfully.",
            PoolMessage::EntriesAdded => "Your entries added successfully.",
        }
    }
}

impl fmt::Display for PoolMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// States of the mixing pool.
///
/// `Error` and `Success` are terminal client-side states; the coordinator
/// never enters them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolState {
    Idle,
    Queue,
    AcceptingEntries,
    Signing,
    Error,
    Success,
}

impl PoolState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolState::Idle => "IDLE",
            PoolState::Queue => "QUEUE",
            PoolState::AcceptingEntries => "ACCEPTING_ENTRIES",
            PoolState::Signing => "SIGNING",
            PoolState::Error => "ERROR",
            PoolState::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue/session status carried in advertisements and status updates.
///
/// Ordering matters: anything above `Open` is session-private and is only
/// ever pushed to participants, never flooded.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PoolStatusUpdate {
    Closed,
    Open,
    Ready,
    Full,
    Rejected,
    Accepted,
}

/// A signed advertisement that a masternode is open to mixing a
/// denomination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinJoinQueue {
    pub denom: Denom,
    pub masternode_outpoint: Outpoint,
    /// Block height the advertisement was (re-)signed at.
    pub height: u32,
    pub status: PoolStatusUpdate,
    pub signature: Option<Signature>,
    /// Local bookkeeping: whether a client already tried this queue.
    #[serde(skip)]
    pub tried: bool,
}

impl CoinJoinQueue {
    pub fn new(
        denom: Denom,
        masternode_outpoint: Outpoint,
        height: u32,
        status: PoolStatusUpdate,
    ) -> Self {
        Self {
            denom,
            masternode_outpoint,
            height,
            status,
            signature: None,
            tried: false,
        }
    }

    /// Digest the masternode signs: every field except the signature.
    pub fn signature_hash(&self) -> [u8; 32] {
        let fields = bincode::serialize(&(
            &self.denom,
            &self.masternode_outpoint,
            self.height,
            &self.status,
        ))
        .expect("queue fields are always serializable");
        blake2b_256_multi(&[b"keel/queue", &fields])
    }

    pub fn sign(&mut self, key: &PrivateKey) {
        self.signature = Some(sign_hash(&self.signature_hash(), key));
    }

    pub fn verify(&self, key: &PublicKey) -> bool {
        match &self.signature {
            Some(sig) => verify_hash(&self.signature_hash(), sig, key),
            None => false,
        }
    }

    /// Expired when more than `ttl_blocks` blocks elapsed since signing.
    pub fn is_expired(&self, current_height: u32, ttl_blocks: u32) -> bool {
        current_height.saturating_sub(self.height) > ttl_blocks
    }

    pub fn is_open(&self) -> bool {
        self.status > PoolStatusUpdate::Closed
    }

    /// Same masternode, same status — the dedup identity used by gossip.
    pub fn matches(&self, other: &CoinJoinQueue) -> bool {
        self.masternode_outpoint == other.masternode_outpoint && self.status == other.status
    }
}

impl fmt::Display for CoinJoinQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "denom={}, height={}, status={:?}, masternode={}",
            self.denom, self.height, self.status, self.masternode_outpoint
        )
    }
}

/// A client's submission to the mixing pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoinJoinEntry {
    pub session_id: u32,
    pub psbt: PartialTransaction,
    /// Originating peer; attached on receipt, never serialized.
    #[serde(skip)]
    pub peer: Option<crate::PeerAddr>,
}

impl CoinJoinEntry {
    pub fn new(session_id: u32, psbt: PartialTransaction) -> Self {
        Self {
            session_id,
            psbt,
            peer: None,
        }
    }
}

// Entries are identical when they describe the same submission, regardless
// of which peer relayed them.
impl PartialEq for CoinJoinEntry {
    fn eq(&self, other: &Self) -> bool {
        self.session_id == other.session_id && self.psbt.tx.hash() == other.psbt.tx.hash()
    }
}

/// The signed envelope the coordinator wraps around the final mixing
/// transaction before pushing it to participants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalTxBroadcast {
    pub session_id: u32,
    pub psbt: PartialTransaction,
    pub masternode_outpoint: Outpoint,
    pub signed_at: Timestamp,
    pub signature: Option<Signature>,
}

impl FinalTxBroadcast {
    pub fn new(
        session_id: u32,
        psbt: PartialTransaction,
        masternode_outpoint: Outpoint,
        signed_at: Timestamp,
    ) -> Self {
        Self {
            session_id,
            psbt,
            masternode_outpoint,
            signed_at,
            signature: None,
        }
    }

    pub fn signature_hash(&self) -> [u8; 32] {
        let fields = bincode::serialize(&(
            self.session_id,
            self.psbt.tx.hash(),
            &self.masternode_outpoint,
            &self.signed_at,
        ))
        .expect("broadcast fields are always serializable");
        blake2b_256_multi(&[b"keel/finaltx", &fields])
    }

    pub fn sign(&mut self, key: &PrivateKey) {
        self.signature = Some(sign_hash(&self.signature_hash(), key));
    }

    pub fn verify(&self, key: &PublicKey) -> bool {
        match &self.signature {
            Some(sig) => verify_hash(&self.signature_hash(), sig, key),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_crypto::keypair_from_seed;
    use keel_types::TxHash;

    fn sample_outpoint() -> Outpoint {
        Outpoint::new(TxHash::new([1; 32]), 0)
    }

    fn sample_queue() -> CoinJoinQueue {
        CoinJoinQueue::new(
            Denom::from_bits(0b01),
            sample_outpoint(),
            100,
            PoolStatusUpdate::Open,
        )
    }

    #[test]
    fn queue_sign_and_verify() {
        let kp = keypair_from_seed(&[3; 32]);
        let mut queue = sample_queue();
        assert!(!queue.verify(&kp.public));
        queue.sign(&kp.private);
        assert!(queue.verify(&kp.public));
    }

    #[test]
    fn queue_signature_covers_status() {
        let kp = keypair_from_seed(&[3; 32]);
        let mut queue = sample_queue();
        queue.sign(&kp.private);
        queue.status = PoolStatusUpdate::Ready;
        assert!(!queue.verify(&kp.public));
    }

    #[test]
    fn queue_expiry() {
        let queue = sample_queue();
        assert!(!queue.is_expired(100, 3));
        assert!(!queue.is_expired(103, 3));
        assert!(queue.is_expired(104, 3));
        // heights below the signing height never expire it
        assert!(!queue.is_expired(0, 3));
    }

    #[test]
    fn queue_match_identity() {
        let a = sample_queue();
        let mut b = sample_queue();
        assert!(a.matches(&b));
        b.status = PoolStatusUpdate::Ready;
        assert!(!a.matches(&b));
    }

    #[test]
    fn status_ordering() {
        assert!(PoolStatusUpdate::Open > PoolStatusUpdate::Closed);
        assert!(PoolStatusUpdate::Ready > PoolStatusUpdate::Open);
        assert!(PoolStatusUpdate::Full > PoolStatusUpdate::Ready);
    }

    #[test]
    fn entry_equality_ignores_peer() {
        let psbt = PartialTransaction::default();
        let mut a = CoinJoinEntry::new(7, psbt.clone());
        let b = CoinJoinEntry::new(7, psbt);
        a.peer = Some(crate::PeerAddr::new("1.2.3.4", 9999));
        assert_eq!(a, b);
    }

    #[test]
    fn final_broadcast_sign_and_verify() {
        let kp = keypair_from_seed(&[4; 32]);
        let mut broadcast = FinalTxBroadcast::new(
            1,
            PartialTransaction::default(),
            sample_outpoint(),
            Timestamp::new(1000),
        );
        broadcast.sign(&kp.private);
        assert!(broadcast.verify(&kp.public));
        assert!(!broadcast.verify(&keypair_from_seed(&[5; 32]).public));
    }

    #[test]
    fn pool_message_text() {
        assert_eq!(
            PoolMessage::ErrQueueFull.description(),
            "Masternode queue is full."
        );
    }
}
