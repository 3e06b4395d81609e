//! Fundamental types for the Keel masternode service layer.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: hashes, outpoints, amounts and mixing denominations, key and
//! signature types, timestamps, and protocol parameters.

pub mod amount;
pub mod hash;
pub mod keys;
pub mod outpoint;
pub mod params;
pub mod time;

pub use amount::{is_denominated_amount, Amount, Denom, COIN, DENOM_COUNT, DENOM_LOW};
pub use hash::{ObjectHash, TxHash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use outpoint::Outpoint;
pub use params::ProtocolParams;
pub use time::Timestamp;
