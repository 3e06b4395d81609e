//! The mixing session base state.

use keel_messages::{CoinJoinEntry, PoolMessage, PoolState};
use keel_transactions::PartialTransaction;
use keel_types::{is_denominated_amount, Amount, Denom, ProtocolParams, Timestamp};

/// One mixing session's state. `Error` and `Success` are terminal states
/// reserved for the client role; the coordinator cycles through
/// `Idle → Queue → AcceptingEntries → Signing → Idle`.
pub struct MixSession {
    pub state: PoolState,
    /// Zero while no session is active.
    pub session_id: u32,
    /// Union of every admitted participant's denomination mask.
    pub denom: Denom,
    pub entries: Vec<CoinJoinEntry>,
    /// The merged transaction being signed, present in `Signing`.
    pub final_psbt: Option<PartialTransaction>,
    /// Timer base for the accepting and signing deadlines.
    pub time_start: Timestamp,
}

impl MixSession {
    pub fn new() -> Self {
        Self {
            state: PoolState::Idle,
            session_id: 0,
            denom: Denom::NONE,
            entries: Vec::new(),
            final_psbt: None,
            time_start: Timestamp::EPOCH,
        }
    }

    /// Total cancellation back to idle.
    pub fn set_null(&mut self) {
        self.state = PoolState::Idle;
        self.session_id = 0;
        self.denom = Denom::NONE;
        self.entries.clear();
        self.final_psbt = None;
        self.time_start = Timestamp::EPOCH;
    }

    pub fn entries_count(&self) -> usize {
        self.entries.len()
    }

    /// Check a partial transaction and compute its implied fee.
    ///
    /// Unsigned mode (entry submission) verifies input UTXOs and
    /// denominations only. Signed mode (the merged final transaction)
    /// additionally requires every input signed and the fee inside the
    /// sanity band.
    pub fn check_transaction(
        &self,
        psbt: &PartialTransaction,
        unsigned: bool,
        params: &ProtocolParams,
    ) -> Result<Amount, PoolMessage> {
        let out_amount = psbt.tx.total_output_value();

        let mut in_amount = Amount::ZERO;
        for (index, _) in psbt.tx.inputs.iter().enumerate() {
            let Some(utxo) = psbt.input_utxo(index) else {
                return Err(PoolMessage::ErrMissingTx);
            };
            if !is_denominated_amount(utxo.value) {
                return Err(PoolMessage::ErrInvalidInput);
            }
            in_amount = in_amount.saturating_add(utxo.value);
        }

        let fee = Amount::new(in_amount.units() - out_amount.units());

        if unsigned {
            return Ok(fee);
        }

        for input in &psbt.inputs {
            if !input.is_signed() {
                return Err(PoolMessage::ErrInvalidInput);
            }
        }

        // there should be a fee in a mixing tx, but a modest one
        if fee < params.min_relay_tx_fee || fee > params.max_tx_fee {
            return Err(PoolMessage::ErrFees);
        }
        Ok(fee)
    }
}

impl Default for MixSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_transactions::{PsbtInput, Script, Transaction, TxIn, TxOut};
    use keel_types::{Outpoint, PublicKey, Signature, TxHash};

    fn denominated_psbt(in_values: &[i64], out_values: &[i64]) -> PartialTransaction {
        let tx = Transaction {
            inputs: (0..in_values.len())
                .map(|i| TxIn::new(Outpoint::new(TxHash::new([i as u8 + 1; 32]), 0)))
                .collect(),
            outputs: out_values
                .iter()
                .map(|v| TxOut::new(Amount::new(*v), Script::PayToKeyHash([9; 20])))
                .collect(),
            lock_height: 0,
        };
        let mut psbt = PartialTransaction::from_unsigned(tx);
        for (input, value) in psbt.inputs.iter_mut().zip(in_values) {
            input.utxo = Some(TxOut::new(Amount::new(*value), Script::WitnessKeyHash([8; 20])));
        }
        psbt
    }

    fn sign_all(psbt: &mut PartialTransaction) {
        for input in psbt.inputs.iter_mut() {
            input.partial_sig = Some((PublicKey([1; 32]), Signature([2; 64])));
        }
    }

    #[test]
    fn set_null_resets_everything() {
        let mut session = MixSession::new();
        session.state = PoolState::Signing;
        session.session_id = 99;
        session.denom = Denom::from_bits(0b11);
        session.entries.push(CoinJoinEntry::new(99, PartialTransaction::default()));
        session.final_psbt = Some(PartialTransaction::default());
        session.time_start = Timestamp::new(100);

        session.set_null();
        assert_eq!(session.state, PoolState::Idle);
        assert_eq!(session.session_id, 0);
        assert!(session.denom.is_empty());
        assert!(session.entries.is_empty());
        assert!(session.final_psbt.is_none());
        assert_eq!(session.time_start, Timestamp::EPOCH);
    }

    #[test]
    fn unsigned_check_computes_fee() {
        let session = MixSession::new();
        let params = ProtocolParams::default();
        let psbt = denominated_psbt(&[800_000, 800_000], &[800_000, 400_000, 200_000, 100_000, 50_000]);
        let fee = session.check_transaction(&psbt, true, &params).unwrap();
        assert_eq!(fee, Amount::new(50_000));
    }

    #[test]
    fn missing_utxo_rejected() {
        let session = MixSession::new();
        let params = ProtocolParams::default();
        let mut psbt = denominated_psbt(&[800_000], &[400_000]);
        psbt.inputs[0] = PsbtInput::default();
        assert_eq!(
            session.check_transaction(&psbt, true, &params),
            Err(PoolMessage::ErrMissingTx)
        );
    }

    #[test]
    fn non_denominated_input_rejected() {
        let session = MixSession::new();
        let params = ProtocolParams::default();
        let psbt = denominated_psbt(&[123_456], &[50_000]);
        assert_eq!(
            session.check_transaction(&psbt, true, &params),
            Err(PoolMessage::ErrInvalidInput)
        );
    }

    #[test]
    fn signed_check_requires_signatures() {
        let session = MixSession::new();
        let params = ProtocolParams::default();
        let psbt = denominated_psbt(&[800_000], &[400_000, 200_000, 100_000, 50_000]);
        assert_eq!(
            session.check_transaction(&psbt, false, &params),
            Err(PoolMessage::ErrInvalidInput)
        );
    }

    #[test]
    fn signed_check_enforces_fee_band() {
        let session = MixSession::new();
        let params = ProtocolParams::default();

        // zero fee: below the relay minimum
        let mut psbt = denominated_psbt(&[800_000], &[800_000]);
        sign_all(&mut psbt);
        assert_eq!(
            session.check_transaction(&psbt, false, &params),
            Err(PoolMessage::ErrFees)
        );

        // sane fee passes
        let mut psbt = denominated_psbt(&[800_000], &[400_000, 200_000, 100_000, 50_000]);
        sign_all(&mut psbt);
        assert_eq!(
            session.check_transaction(&psbt, false, &params),
            Ok(Amount::new(50_000))
        );
    }
}
