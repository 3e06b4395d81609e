//! Governance wire types: objects, votes, and their payloads.
//!
//! An object's `data` blob is an encoded [`ObjectPayload`]; a blob that
//! fails to decode marks the object unparsable but still travels the wire
//! (the hash commits to the raw bytes, not the decoded form).

use keel_crypto::{blake2b_256_multi, sign_hash, verify_hash};
use keel_transactions::Script;
use keel_types::{Amount, ObjectHash, Outpoint, PrivateKey, PublicKey, Signature, Timestamp, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of governance object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovObjectType {
    Unknown,
    Proposal,
    Trigger,
}

/// A funding proposal's decoded payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalPayload {
    pub name: String,
    pub url: String,
    pub payment_script: Script,
    pub payment_amount: Amount,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl ProposalPayload {
    /// Field-level sanity, checked before a proposal is stored.
    pub fn is_well_formed(&self) -> bool {
        !self.name.is_empty()
            && self.name.len() <= 40
            && self.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && self.url.len() <= 256
            && self.payment_amount > Amount::ZERO
            && self.start_time < self.end_time
    }
}

/// A superblock trigger's decoded payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerPayload {
    /// The superblock height this trigger schedules.
    pub event_height: u32,
    pub payments: Vec<(Script, Amount)>,
}

impl TriggerPayload {
    pub fn is_well_formed(&self) -> bool {
        self.event_height > 0
            && !self.payments.is_empty()
            && self.payments.iter().all(|(_, amount)| *amount > Amount::ZERO)
    }
}

/// The decoded form of a governance object's data blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectPayload {
    Proposal(ProposalPayload),
    Trigger(TriggerPayload),
}

impl ObjectPayload {
    pub fn object_type(&self) -> GovObjectType {
        match self {
            ObjectPayload::Proposal(_) => GovObjectType::Proposal,
            ObjectPayload::Trigger(_) => GovObjectType::Trigger,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("payload is always serializable")
    }

    pub fn decode(data: &[u8]) -> Option<ObjectPayload> {
        bincode::deserialize(data).ok()
    }
}

/// A governance object as it travels the wire. Immutable on receipt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernanceObject {
    pub parent_hash: ObjectHash,
    pub revision: u32,
    pub created_time: Timestamp,
    pub collateral_txid: TxHash,
    pub data: Vec<u8>,
    /// Signing masternode; null for collateral-backed proposals.
    pub masternode_outpoint: Outpoint,
    pub signature: Option<Signature>,
}

impl GovernanceObject {
    /// The object's identity. Commits to the signature but not the
    /// collateral txid, so the same content re-signed is a new object
    /// while re-submitting under a different collateral is not.
    pub fn hash(&self) -> ObjectHash {
        let sig_bytes: &[u8] = match &self.signature {
            Some(sig) => sig.as_bytes(),
            None => &[],
        };
        let fields = bincode::serialize(&(
            &self.parent_hash,
            self.revision,
            &self.created_time,
            &self.data,
            &self.masternode_outpoint,
        ))
        .expect("object fields are always serializable");
        ObjectHash::new(blake2b_256_multi(&[&fields, sig_bytes]))
    }

    /// Digest the masternode signs:
    /// `parent || revision || time || data || outpoint || collateral`.
    pub fn signature_hash(&self) -> [u8; 32] {
        let fields = bincode::serialize(&(
            &self.parent_hash,
            self.revision,
            &self.created_time,
            &self.data,
            &self.masternode_outpoint,
            &self.collateral_txid,
        ))
        .expect("object fields are always serializable");
        blake2b_256_multi(&[b"keel/govobj", &fields])
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

    pub fn payload(&self) -> Option<ObjectPayload> {
        ObjectPayload::decode(&self.data)
    }

    pub fn object_type(&self) -> GovObjectType {
        self.payload()
            .map(|p| p.object_type())
            .unwrap_or(GovObjectType::Unknown)
    }
}

/// Which derived flag a vote speaks to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum VoteSignal {
    Funding,
    Valid,
    Delete,
    Endorsed,
}

/// A vote's verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    Yes,
    No,
    Abstain,
}

/// A masternode's vote on a governance object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernanceVote {
    pub masternode_outpoint: Outpoint,
    pub parent_hash: ObjectHash,
    pub signal: VoteSignal,
    pub outcome: VoteOutcome,
    pub timestamp: Timestamp,
    pub signature: Option<Signature>,
}

impl GovernanceVote {
    pub fn new(
        masternode_outpoint: Outpoint,
        parent_hash: ObjectHash,
        signal: VoteSignal,
        outcome: VoteOutcome,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            masternode_outpoint,
            parent_hash,
            signal,
            outcome,
            timestamp,
            signature: None,
        }
    }

    /// The vote's identity, over everything except the signature.
    pub fn hash(&self) -> ObjectHash {
        ObjectHash::new(self.signature_hash())
    }

    pub fn signature_hash(&self) -> [u8; 32] {
        let fields = bincode::serialize(&(
            &self.masternode_outpoint,
            &self.parent_hash,
            &self.signal,
            &self.outcome,
            &self.timestamp,
        ))
        .expect("vote fields are always serializable");
        blake2b_256_multi(&[b"keel/govvote", &fields])
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

impl fmt::Display for GovernanceVote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:?}:{:?} on {:?} at {}",
            self.masternode_outpoint, self.signal, self.outcome, self.parent_hash, self.timestamp
        )
    }
}
