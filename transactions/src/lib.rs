//! Transaction model for the Keel masternode service layer.
//!
//! The mixing coordinator merges partial transactions from mutually
//! mistrusting peers, so alongside the plain [`Transaction`] carcass this
//! crate carries a PSBT-style [`PartialTransaction`] that supports
//! per-input UTXO attachment, signature merging, and final extraction.
//! Full consensus validation is the host node's business, not ours.

pub mod psbt;
pub mod script;
pub mod tx;

pub use psbt::{PartialTransaction, PsbtError, PsbtInput};
pub use script::Script;
pub use tx::{Transaction, TxIn, TxOut};
