//! Outpoints — (transaction hash, output index) pairs.
//!
//! Masternodes are identified by the outpoint of their staked collateral
//! UTXO, so outpoints double as masternode identities throughout the
//! service layer.

use crate::hash::TxHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a specific output of a specific transaction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    pub txid: TxHash,
    pub vout: u32,
}

impl Outpoint {
    pub const NULL: Self = Self {
        txid: TxHash::ZERO,
        vout: u32::MAX,
    };

    pub fn new(txid: TxHash, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Debug for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Outpoint({:?}:{})", self.txid, self.vout)
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short form: first 8 hex chars of the txid, like the node's logs
        let full = self.txid.to_string();
        write!(f, "{}-{}", &full[..8], self.vout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_outpoint() {
        assert!(Outpoint::NULL.is_null());
        assert!(!Outpoint::new(TxHash::new([1; 32]), 0).is_null());
    }

    #[test]
    fn display_short_form() {
        let o = Outpoint::new(TxHash::new([0xAB; 32]), 3);
        assert_eq!(o.to_string(), "abababab-3");
    }
}
