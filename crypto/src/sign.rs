//! Ed25519 message signing and verification.
//!
//! Signed artifacts in the service layer (queues, objects, votes, final-tx
//! broadcasts) are always hashed first and the 32-byte digest signed, so
//! [`sign_hash`]/[`verify_hash`] are the workhorses.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use keel_types::{PrivateKey, PublicKey, Signature};

/// Sign an arbitrary message with a private key.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    let sig = signing_key.sign(message);
    Signature(sig.to_bytes())
}

/// Verify a signature over an arbitrary message.
///
/// Returns `false` for malformed keys and non-canonical signatures as well
/// as plain mismatches.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &dalek_sig).is_ok()
}

/// Sign a 32-byte digest.
pub fn sign_hash(hash: &[u8; 32], private_key: &PrivateKey) -> Signature {
    sign_message(hash, private_key)
}

/// Verify a signature over a 32-byte digest.
pub fn verify_hash(hash: &[u8; 32], signature: &Signature, public_key: &PublicKey) -> bool {
    verify_signature(hash, signature, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;

    #[test]
    fn sign_and_verify() {
        let kp = generate_keypair();
        let msg = b"queue advertisement";
        let sig = sign_message(msg, &kp.private);
        assert!(verify_signature(msg, &sig, &kp.public));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = generate_keypair();
        let sig = sign_message(b"right", &kp.private);
        assert!(!verify_signature(b"wrong", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = generate_keypair();
        let kp2 = generate_keypair();
        let sig = sign_message(b"msg", &kp1.private);
        assert!(!verify_signature(b"msg", &sig, &kp2.public));
    }

    #[test]
    fn hash_signing_round_trip() {
        let kp = generate_keypair();
        let digest = crate::hash::blake2b_256(b"artifact");
        let sig = sign_hash(&digest, &kp.private);
        assert!(verify_hash(&digest, &sig, &kp.public));
    }

    #[test]
    fn invalid_public_key_rejected() {
        let kp = generate_keypair();
        let sig = sign_message(b"msg", &kp.private);
        assert!(!verify_signature(b"msg", &sig, &PublicKey([0xFF; 32])));
    }
}
