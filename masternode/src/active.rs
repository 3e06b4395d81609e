//! The local masternode identity.

use keel_crypto::sign_hash;
use keel_types::{KeyPair, Outpoint, PublicKey, Signature};

/// The identity this node operates under when running in masternode mode:
/// the staked collateral outpoint plus the operator key that signs queues,
/// final-tx broadcasts and governance artifacts.
pub struct ActiveMasternode {
    pub outpoint: Outpoint,
    keypair: KeyPair,
}

impl ActiveMasternode {
    pub fn new(outpoint: Outpoint, keypair: KeyPair) -> Self {
        Self { outpoint, keypair }
    }

    pub fn pubkey(&self) -> PublicKey {
        self.keypair.public
    }

    /// Sign a 32-byte artifact digest with the operator key.
    pub fn sign(&self, hash: &[u8; 32]) -> Signature {
        sign_hash(hash, &self.keypair.private)
    }
}
