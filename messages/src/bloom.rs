//! Bloom filters for vote synchronization.
//!
//! When a node re-requests an object's votes it attaches a filter of the
//! vote hashes it already holds, so the responder only advertises the
//! difference. False positives merely suppress a re-send; they are never
//! a correctness problem.

use keel_crypto::blake2b_256_multi;
use keel_types::ObjectHash;
use serde::{Deserialize, Serialize};

/// Largest filter accepted off the wire, in bytes.
pub const MAX_BLOOM_FILTER_SIZE: usize = 36_000;
/// Most hash functions a filter may use.
pub const MAX_HASH_FUNCS: u32 = 50;

const LN2_SQUARED: f64 = std::f64::consts::LN_2 * std::f64::consts::LN_2;

/// A fixed-size bloom filter over 32-byte hashes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    bits: Vec<u8>,
    hash_funcs: u32,
    tweak: u32,
}

impl BloomFilter {
    /// Size a filter for `elements` entries at the given false-positive
    /// rate. `tweak` decorrelates filters built by different requesters.
    pub fn new(elements: usize, fp_rate: f64, tweak: u32) -> Self {
        let elements = elements.max(1);
        let ideal_bytes = (-1.0 / LN2_SQUARED * elements as f64 * fp_rate.ln() / 8.0) as usize;
        let bytes = ideal_bytes.clamp(1, MAX_BLOOM_FILTER_SIZE);
        let ideal_funcs = (bytes as f64 * 8.0 / elements as f64 * std::f64::consts::LN_2) as u32;
        let hash_funcs = ideal_funcs.clamp(1, MAX_HASH_FUNCS);
        Self {
            bits: vec![0u8; bytes],
            hash_funcs,
            tweak,
        }
    }

    fn bit_index(&self, func: u32, data: &[u8]) -> usize {
        let digest = blake2b_256_multi(&[
            &func.to_le_bytes(),
            &self.tweak.to_le_bytes(),
            data,
        ]);
        let word = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        (word as usize) % (self.bits.len() * 8)
    }

    pub fn insert(&mut self, data: &[u8]) {
        for func in 0..self.hash_funcs {
            let index = self.bit_index(func, data);
            self.bits[index / 8] |= 1 << (index % 8);
        }
    }

    pub fn contains(&self, data: &[u8]) -> bool {
        if self.bits.is_empty() {
            return false;
        }
        (0..self.hash_funcs).all(|func| {
            let index = self.bit_index(func, data);
            self.bits[index / 8] & (1 << (index % 8)) != 0
        })
    }

    pub fn insert_hash(&mut self, hash: &ObjectHash) {
        self.insert(hash.as_bytes());
    }

    pub fn contains_hash(&self, hash: &ObjectHash) -> bool {
        self.contains(hash.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_hashes_are_found() {
        let mut filter = BloomFilter::new(100, 0.01, 7);
        for byte in 0..50u8 {
            filter.insert_hash(&ObjectHash::new([byte; 32]));
        }
        for byte in 0..50u8 {
            assert!(filter.contains_hash(&ObjectHash::new([byte; 32])));
        }
    }

    #[test]
    fn fresh_filter_contains_nothing() {
        let filter = BloomFilter::new(100, 0.01, 7);
        assert!(!filter.contains_hash(&ObjectHash::new([1; 32])));
    }

    #[test]
    fn false_positive_rate_is_plausible() {
        let mut filter = BloomFilter::new(1000, 0.01, 0);
        for byte in 0..100u8 {
            filter.insert(&[byte]);
        }
        let false_positives = (0..1000u32)
            .filter(|i| filter.contains(&i.to_be_bytes()))
            .count();
        // 1% target; allow generous slack
        assert!(false_positives < 100, "{false_positives} false positives");
    }

    #[test]
    fn tweak_changes_bit_pattern() {
        let mut a = BloomFilter::new(10, 0.01, 1);
        let mut b = BloomFilter::new(10, 0.01, 2);
        a.insert(b"item");
        b.insert(b"item");
        assert_ne!(a, b);
    }

    #[test]
    fn size_is_capped() {
        let filter = BloomFilter::new(10_000_000, 0.0001, 0);
        assert!(filter.bits.len() <= MAX_BLOOM_FILTER_SIZE);
        assert!(filter.hash_funcs <= MAX_HASH_FUNCS);
    }

    #[test]
    fn round_trips_through_bincode() {
        let mut filter = BloomFilter::new(100, 0.01, 3);
        filter.insert(b"vote");
        let bytes = bincode::serialize(&filter).unwrap();
        let decoded: BloomFilter = bincode::deserialize(&bytes).unwrap();
        assert!(decoded.contains(b"vote"));
    }
}
