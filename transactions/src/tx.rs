//! Plain transactions.

use crate::script::Script;
use keel_crypto::blake2b_256;
use keel_types::{Amount, Outpoint, TxHash};
use serde::{Deserialize, Serialize};

/// A transaction input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    /// The output being spent.
    pub prevout: Outpoint,
    /// Unlocking data; empty on the unsigned carcass.
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prevout: Outpoint) -> Self {
        Self {
            prevout,
            script_sig: Vec::new(),
            sequence: u32::MAX,
        }
    }
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script: Script,
}

impl TxOut {
    pub fn new(value: Amount, script: Script) -> Self {
        Self { value, script }
    }
}

/// A transaction.
///
/// `lock_height` doubles as the payee-selection height for mixing
/// transactions: the coordinator checks masternode fee outputs against the
/// payee of that block.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_height: u32,
}

impl Transaction {
    /// The transaction hash: Blake2b-256 over the serialized transaction.
    pub fn hash(&self) -> TxHash {
        let bytes = bincode::serialize(self).expect("transaction is always serializable");
        TxHash::new(blake2b_256(&bytes))
    }

    pub fn total_output_value(&self) -> Amount {
        self.outputs
            .iter()
            .fold(Amount::ZERO, |acc, out| acc.saturating_add(out.value))
    }
}
