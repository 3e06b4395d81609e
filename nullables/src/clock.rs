//! Nullable clock — time only advances when the test says so.

use keel_masternode::Clock;
use keel_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock. Wall and adjusted time are the same value.
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }

    fn adjusted(&self) -> Timestamp {
        self.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_on_request() {
        let clock = NullClock::new(1000);
        assert_eq!(clock.now(), Timestamp::new(1000));
        clock.advance(30);
        assert_eq!(clock.now(), Timestamp::new(1030));
        clock.set(99);
        assert_eq!(clock.adjusted(), Timestamp::new(99));
    }
}
