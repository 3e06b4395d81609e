//! Ed25519 key pair construction.

use ed25519_dalek::SigningKey;
use keel_types::{KeyPair, PrivateKey, PublicKey};
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate a fresh random key pair from the OS entropy source.
pub fn generate_keypair() -> KeyPair {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    keypair_from_seed(&seed)
}

/// Derive the deterministic key pair for a 32-byte seed.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let signing_key = SigningKey::from_bytes(seed);
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(*seed),
    }
}

/// Recover the public key belonging to a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_derivation_is_deterministic() {
        let a = keypair_from_seed(&[7u8; 32]);
        let b = keypair_from_seed(&[7u8; 32]);
        assert_eq!(a.public, b.public);
    }

    #[test]
    fn different_seeds_different_keys() {
        let a = keypair_from_seed(&[1u8; 32]);
        let b = keypair_from_seed(&[2u8; 32]);
        assert_ne!(a.public, b.public);
    }

    #[test]
    fn public_recoverable_from_private() {
        let kp = generate_keypair();
        assert_eq!(public_from_private(&kp.private), kp.public);
    }
}
