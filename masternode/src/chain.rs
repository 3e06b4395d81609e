//! Chain and clock interfaces.

use keel_transactions::{Script, Transaction, TxOut};
use keel_types::{Outpoint, Timestamp, TxHash};

/// The host's view of the active chain and mempool.
pub trait Chain: Send + Sync {
    /// Height of the active tip.
    fn height(&self) -> u32;

    /// A transaction and the height of the block containing it (`None`
    /// while unconfirmed). Used to check governance collateral.
    fn get_transaction(&self, txid: &TxHash) -> Option<(Transaction, Option<u32>)>;

    /// The output an outpoint refers to, if unspent.
    fn utxo(&self, outpoint: &Outpoint) -> Option<TxOut>;

    /// The masternode payee script for the block at `height`.
    fn block_payee(&self, height: u32) -> Option<Script>;

    /// Submit the finalized mixing transaction to the mempool.
    fn accept_to_mempool(&self, tx: &Transaction) -> bool;

    /// Whether the node is still in initial block download.
    fn initial_block_download(&self) -> bool;
}

/// The host's clocks.
pub trait Clock: Send + Sync {
    /// Wall clock, for session timers.
    fn now(&self) -> Timestamp;

    /// Network-adjusted clock, for everything compared against
    /// peer-supplied timestamps.
    fn adjusted(&self) -> Timestamp;
}
