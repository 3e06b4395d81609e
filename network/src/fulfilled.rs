//! Per-peer fulfilled-request tracking.
//!
//! Some requests are legitimate once per connection and abusive when
//! repeated, a full governance sync in particular. The tracker remembers
//! which (peer, request) pairs have been served and when the memory
//! expires, so a reconnecting peer gets a fresh allowance.

use keel_messages::PeerAddr;
use keel_types::Timestamp;
use std::collections::HashMap;

/// How long a fulfilled request is remembered, in seconds.
pub const FULFILLED_REQUEST_TTL_SECS: u64 = 60 * 60;

/// Remembers which requests each peer has already been served.
pub struct FulfilledRequestTracker {
    fulfilled: HashMap<(PeerAddr, &'static str), Timestamp>,
    ttl_secs: u64,
}

impl FulfilledRequestTracker {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            fulfilled: HashMap::new(),
            ttl_secs,
        }
    }

    /// Whether `peer` was already served `request` and the memory has not
    /// expired.
    pub fn has_fulfilled(&self, peer: &PeerAddr, request: &'static str, now: Timestamp) -> bool {
        match self.fulfilled.get(&(peer.clone(), request)) {
            Some(at) => !at.has_expired(self.ttl_secs, now),
            None => false,
        }
    }

    /// Record that `peer` was served `request`.
    pub fn add_fulfilled(&mut self, peer: &PeerAddr, request: &'static str, now: Timestamp) {
        self.fulfilled.insert((peer.clone(), request), now);
    }

    /// Drop expired memories.
    pub fn sweep(&mut self, now: Timestamp) {
        let ttl = self.ttl_secs;
        self.fulfilled.retain(|_, at| !at.has_expired(ttl, now));
    }

    pub fn len(&self) -> usize {
        self.fulfilled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fulfilled.is_empty()
    }
}

impl Default for FulfilledRequestTracker {
    fn default() -> Self {
        Self::new(FULFILLED_REQUEST_TTL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> PeerAddr {
        PeerAddr::new("10.0.0.1", 9999)
    }

    #[test]
    fn fresh_tracker_has_nothing() {
        let tracker = FulfilledRequestTracker::new(100);
        assert!(!tracker.has_fulfilled(&peer(), "govsync", Timestamp::new(0)));
    }

    #[test]
    fn recorded_requests_are_remembered() {
        let mut tracker = FulfilledRequestTracker::new(100);
        tracker.add_fulfilled(&peer(), "govsync", Timestamp::new(1000));
        assert!(tracker.has_fulfilled(&peer(), "govsync", Timestamp::new(1050)));
        // different request name is independent
        assert!(!tracker.has_fulfilled(&peer(), "mnsync", Timestamp::new(1050)));
    }

    #[test]
    fn memories_expire() {
        let mut tracker = FulfilledRequestTracker::new(100);
        tracker.add_fulfilled(&peer(), "govsync", Timestamp::new(1000));
        assert!(!tracker.has_fulfilled(&peer(), "govsync", Timestamp::new(1100)));
    }

    #[test]
    fn sweep_drops_expired() {
        let mut tracker = FulfilledRequestTracker::new(100);
        tracker.add_fulfilled(&peer(), "govsync", Timestamp::new(1000));
        tracker.add_fulfilled(&PeerAddr::new("10.0.0.2", 9999), "govsync", Timestamp::new(1090));
        tracker.sweep(Timestamp::new(1150));
        assert_eq!(tracker.len(), 1);
    }
}
