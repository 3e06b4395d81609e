//! Partially signed transactions.
//!
//! A [`PartialTransaction`] is the unsigned carcass plus per-input signing
//! metadata. Participants each sign their own inputs and return the result;
//! the coordinator merges all partials into one and extracts the fully
//! signed transaction once every input carries a signature.

use crate::script::Script;
use crate::tx::{Transaction, TxOut};
use keel_types::{PublicKey, Signature};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PsbtError {
    #[error("partial transactions describe different unsigned transactions")]
    TransactionMismatch,

    #[error("input {0} carries no signature")]
    IncompleteInput(usize),

    #[error("input {0} has no attached UTXO")]
    MissingUtxo(usize),
}

/// Signing metadata for one input.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PsbtInput {
    /// The output this input spends, attached by whoever knows it.
    pub utxo: Option<TxOut>,
    /// A signature from the input's owner, not yet finalized.
    pub partial_sig: Option<(PublicKey, Signature)>,
    /// Finalized unlocking data, ready to splice into the transaction.
    pub final_script_sig: Option<Vec<u8>>,
}

impl PsbtInput {
    pub fn is_signed(&self) -> bool {
        self.final_script_sig.is_some() || self.partial_sig.is_some()
    }
}

/// A transaction carcass plus per-input signing state.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartialTransaction {
    pub tx: Transaction,
    pub inputs: Vec<PsbtInput>,
}

impl PartialTransaction {
    /// Wrap an unsigned transaction, one blank input record per `vin`.
    pub fn from_unsigned(tx: Transaction) -> Self {
        let inputs = tx.inputs.iter().map(|_| PsbtInput::default()).collect();
        Self { tx, inputs }
    }

    /// The UTXO attached to input `index`, if any.
    pub fn input_utxo(&self, index: usize) -> Option<&TxOut> {
        self.inputs.get(index).and_then(|i| i.utxo.as_ref())
    }

    /// Merge another partial into this one.
    ///
    /// Both sides must describe the same unsigned transaction; fields we
    /// lack are taken from `other`, fields we already have win.
    pub fn merge(&mut self, other: &PartialTransaction) -> Result<(), PsbtError> {
        if self.tx.hash() != other.tx.hash() || self.inputs.len() != other.inputs.len() {
            return Err(PsbtError::TransactionMismatch);
        }
        for (ours, theirs) in self.inputs.iter_mut().zip(other.inputs.iter()) {
            if ours.utxo.is_none() {
                ours.utxo = theirs.utxo.clone();
            }
            if ours.partial_sig.is_none() {
                ours.partial_sig = theirs.partial_sig;
            }
            if ours.final_script_sig.is_none() {
                ours.final_script_sig = theirs.final_script_sig.clone();
            }
        }
        Ok(())
    }

    /// Whether every input carries a signature.
    pub fn is_complete(&self) -> bool {
        self.inputs.iter().all(|i| i.is_signed())
    }

    /// Attach the previous output for every input classified as witness,
    /// looking prevouts up through `lookup`.
    pub fn fill_witness_utxos<F>(&mut self, lookup: F)
    where
        F: Fn(&keel_types::Outpoint) -> Option<TxOut>,
    {
        for (input, txin) in self.inputs.iter_mut().zip(self.tx.inputs.iter()) {
            if input.utxo.is_some() {
                continue;
            }
            if let Some(prev) = lookup(&txin.prevout) {
                if matches!(prev.script, Script::WitnessKeyHash(_)) {
                    input.utxo = Some(prev);
                }
            }
        }
    }

    /// Splice the collected signatures into the carcass and return the
    /// fully signed transaction.
    pub fn finalize_and_extract(&self) -> Result<Transaction, PsbtError> {
        let mut tx = self.tx.clone();
        for (index, input) in self.inputs.iter().enumerate() {
            let script_sig = match (&input.final_script_sig, &input.partial_sig) {
                (Some(finalized), _) => finalized.clone(),
                (None, Some((key, sig))) => {
                    let mut bytes = sig.as_bytes().to_vec();
                    bytes.extend_from_slice(key.as_bytes());
                    bytes
                }
                (None, None) => return Err(PsbtError::IncompleteInput(index)),
            };
            tx.inputs[index].script_sig = script_sig;
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::TxIn;
    use keel_types::{Amount, Outpoint, TxHash};

    fn two_input_tx() -> Transaction {
        Transaction {
            inputs: vec![
                TxIn::new(Outpoint::new(TxHash::new([1; 32]), 0)),
                TxIn::new(Outpoint::new(TxHash::new([2; 32]), 1)),
            ],
            outputs: vec![TxOut::new(
                Amount::new(50_000),
                Script::pay_to_key(&PublicKey([9; 32])),
            )],
            lock_height: 10,
        }
    }

    fn signed_input() -> PsbtInput {
        PsbtInput {
            utxo: None,
            partial_sig: Some((PublicKey([3; 32]), Signature([4; 64]))),
            final_script_sig: None,
        }
    }

    #[test]
    fn from_unsigned_blanks_every_input() {
        let psbt = PartialTransaction::from_unsigned(two_input_tx());
        assert_eq!(psbt.inputs.len(), 2);
        assert!(!psbt.is_complete());
    }

    #[test]
    fn merge_combines_signatures() {
        let mut ours = PartialTransaction::from_unsigned(two_input_tx());
        let mut theirs = ours.clone();
        ours.inputs[0] = signed_input();
        theirs.inputs[1] = signed_input();

        ours.merge(&theirs).unwrap();
        assert!(ours.is_complete());
    }

    #[test]
    fn merge_rejects_different_transactions() {
        let mut ours = PartialTransaction::from_unsigned(two_input_tx());
        let mut other_tx = two_input_tx();
        other_tx.lock_height = 11;
        let theirs = PartialTransaction::from_unsigned(other_tx);
        assert_eq!(ours.merge(&theirs), Err(PsbtError::TransactionMismatch));
    }

    #[test]
    fn merge_keeps_existing_fields() {
        let mut ours = PartialTransaction::from_unsigned(two_input_tx());
        ours.inputs[0].partial_sig = Some((PublicKey([1; 32]), Signature([1; 64])));
        let mut theirs = PartialTransaction::from_unsigned(two_input_tx());
        theirs.inputs[0].partial_sig = Some((PublicKey([2; 32]), Signature([2; 64])));

        ours.merge(&theirs).unwrap();
        assert_eq!(ours.inputs[0].partial_sig.unwrap().0, PublicKey([1; 32]));
    }

    #[test]
    fn extract_requires_all_signatures() {
        let mut psbt = PartialTransaction::from_unsigned(two_input_tx());
        psbt.inputs[0] = signed_input();
        assert_eq!(
            psbt.finalize_and_extract(),
            Err(PsbtError::IncompleteInput(1))
        );

        psbt.inputs[1] = signed_input();
        let tx = psbt.finalize_and_extract().unwrap();
        assert!(!tx.inputs[0].script_sig.is_empty());
        assert!(!tx.inputs[1].script_sig.is_empty());
    }

    #[test]
    fn fill_witness_utxos_only_touches_witness_scripts() {
        let mut psbt = PartialTransaction::from_unsigned(two_input_tx());
        let witness_out = TxOut::new(
            Amount::new(50_000),
            Script::WitnessKeyHash([7; 20]),
        );
        let plain_out = TxOut::new(
            Amount::new(50_000),
            Script::PayToKeyHash([8; 20]),
        );
        let w = witness_out.clone();
        psbt.fill_witness_utxos(|outpoint| {
            if outpoint.vout == 0 {
                Some(w.clone())
            } else {
                Some(plain_out.clone())
            }
        });
        assert_eq!(psbt.inputs[0].utxo, Some(witness_out));
        assert_eq!(psbt.inputs[1].utxo, None);
    }
}
