//! Cryptographic primitives for the Keel masternode service layer.
//!
//! - **Ed25519** for masternode signatures on queues, governance objects,
//!   votes and final-tx broadcasts
//! - **Blake2b-256** for every hash in the layer (object hashes, vote
//!   hashes, signature pre-images, bloom filter hashing)

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_160, blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use sign::{sign_hash, sign_message, verify_hash, verify_signature};
