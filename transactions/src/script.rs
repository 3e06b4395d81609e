//! Output scripts.
//!
//! The service layer only ever needs to distinguish three script shapes:
//! plain key-hash payments (masternode payees), witness key-hash payments
//! (mixing outputs that need their UTXO attached during finalization), and
//! unspendable OP_RETURN burns (governance collateral commitments).

use keel_crypto::blake2b_160;
use keel_types::{ObjectHash, PublicKey};
use serde::{Deserialize, Serialize};

/// A transaction output script.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Script {
    /// Pay to the 160-bit hash of a public key.
    PayToKeyHash([u8; 20]),
    /// Witness-v0 pay to key hash.
    WitnessKeyHash([u8; 20]),
    /// Provably unspendable data commitment.
    OpReturn(Vec<u8>),
}

impl Script {
    /// The standard payment script for a public key.
    pub fn pay_to_key(key: &PublicKey) -> Script {
        Script::PayToKeyHash(blake2b_160(key.as_bytes()))
    }

    /// The witness payment script for a public key.
    pub fn witness_pay_to_key(key: &PublicKey) -> Script {
        Script::WitnessKeyHash(blake2b_160(key.as_bytes()))
    }

    /// The proof-of-burn commitment for a governance object hash.
    pub fn burn_commitment(hash: &ObjectHash) -> Script {
        Script::OpReturn(hash.as_bytes().to_vec())
    }

    /// Whether this script can never be spent.
    pub fn is_unspendable(&self) -> bool {
        matches!(self, Script::OpReturn(_))
    }

    /// Whether spending this script requires witness data.
    pub fn is_witness(&self) -> bool {
        matches!(self, Script::WitnessKeyHash(_))
    }
}
