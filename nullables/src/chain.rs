//! Nullable chain — height, transactions and mempool verdicts under test
//! control.

use keel_masternode::Chain;
use keel_transactions::{Script, Transaction, TxOut};
use keel_types::{Outpoint, TxHash};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

pub struct NullChain {
    height: AtomicU32,
    ibd: AtomicBool,
    accept_mempool: AtomicBool,
    txs: Mutex<HashMap<TxHash, (Transaction, Option<u32>)>>,
    utxos: Mutex<HashMap<Outpoint, TxOut>>,
    payee: Mutex<Option<Script>>,
    mempool: Mutex<Vec<Transaction>>,
}

impl NullChain {
    pub fn new() -> Self {
        Self {
            height: AtomicU32::new(0),
            ibd: AtomicBool::new(false),
            accept_mempool: AtomicBool::new(true),
            txs: Mutex::new(HashMap::new()),
            utxos: Mutex::new(HashMap::new()),
            payee: Mutex::new(None),
            mempool: Mutex::new(Vec::new()),
        }
    }

    pub fn set_height(&self, height: u32) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn set_initial_block_download(&self, ibd: bool) {
        self.ibd.store(ibd, Ordering::SeqCst);
    }

    /// Decide whether the mempool accepts or rejects submissions.
    pub fn set_mempool_verdict(&self, accept: bool) {
        self.accept_mempool.store(accept, Ordering::SeqCst);
    }

    pub fn add_transaction(&self, tx: Transaction, height: Option<u32>) {
        self.txs.lock().unwrap().insert(tx.hash(), (tx, height));
    }

    pub fn add_utxo(&self, outpoint: Outpoint, out: TxOut) {
        self.utxos.lock().unwrap().insert(outpoint, out);
    }

    pub fn set_payee(&self, script: Script) {
        *self.payee.lock().unwrap() = Some(script);
    }

    /// Transactions the engines submitted to the mempool.
    pub fn mempool_submissions(&self) -> Vec<Transaction> {
        self.mempool.lock().unwrap().clone()
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain for NullChain {
    fn height(&self) -> u32 {
        self.height.load(Ordering::SeqCst)
    }

    fn get_transaction(&self, txid: &TxHash) -> Option<(Transaction, Option<u32>)> {
        self.txs.lock().unwrap().get(txid).cloned()
    }

    fn utxo(&self, outpoint: &Outpoint) -> Option<TxOut> {
        self.utxos.lock().unwrap().get(outpoint).cloned()
    }

    fn block_payee(&self, _height: u32) -> Option<Script> {
        self.payee.lock().unwrap().clone()
    }

    fn accept_to_mempool(&self, tx: &Transaction) -> bool {
        let accept = self.accept_mempool.load(Ordering::SeqCst);
        if accept {
            self.mempool.lock().unwrap().push(tx.clone());
        }
        accept
    }

    fn initial_block_download(&self) -> bool {
        self.ibd.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mempool_verdict_is_programmable() {
        let chain = NullChain::new();
        let tx = Transaction::default();
        assert!(chain.accept_to_mempool(&tx));
        assert_eq!(chain.mempool_submissions().len(), 1);

        chain.set_mempool_verdict(false);
        assert!(!chain.accept_to_mempool(&tx));
        assert_eq!(chain.mempool_submissions().len(), 1);
    }

    #[test]
    fn transactions_are_found_by_hash() {
        let chain = NullChain::new();
        let tx = Transaction::default();
        let hash = tx.hash();
        chain.add_transaction(tx, Some(50));
        assert_eq!(chain.get_transaction(&hash).unwrap().1, Some(50));
    }
}
