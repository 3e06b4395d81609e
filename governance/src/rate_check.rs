//! Per-masternode trigger creation rate limiting.
//!
//! A fixed-capacity ring of creation timestamps per masternode. The rate
//! is only defined once the ring is full, so a masternode gets a free
//! burst of `RATE_BUFFER_SIZE - 1` triggers before the window engages,
//! after which roughly one trigger per superblock cycle is sustainable.

use serde::{Deserialize, Serialize};

/// Timestamps kept per masternode.
pub const RATE_BUFFER_SIZE: usize = 5;

/// Rate reported when every timestamp in a full ring coincides.
const INFINITE_RATE: f64 = 1.0e10;

/// A fixed-capacity ring buffer of Unix timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateCheckBuffer {
    timestamps: Vec<u64>,
    data_start: usize,
    data_end: usize,
    empty: bool,
}

impl RateCheckBuffer {
    pub fn new() -> Self {
        Self {
            timestamps: vec![0; RATE_BUFFER_SIZE],
            data_start: 0,
            data_end: 0,
            empty: true,
        }
    }

    /// Append a timestamp, displacing the oldest when full.
    pub fn add_timestamp(&mut self, timestamp: u64) {
        if self.data_end == self.data_start && !self.empty {
            self.data_start = (self.data_start + 1) % RATE_BUFFER_SIZE;
        }
        self.timestamps[self.data_end] = timestamp;
        self.data_end = (self.data_end + 1) % RATE_BUFFER_SIZE;
        self.empty = false;
    }

    pub fn min_timestamp(&self) -> u64 {
        if self.empty {
            return u64::MAX;
        }
        let mut index = self.data_start;
        let mut min = u64::MAX;
        loop {
            min = min.min(self.timestamps[index]);
            index = (index + 1) % RATE_BUFFER_SIZE;
            if index == self.data_end {
                break;
            }
        }
        min
    }

    pub fn max_timestamp(&self) -> u64 {
        if self.empty {
            return 0;
        }
        let mut index = self.data_start;
        let mut max = 0;
        loop {
            max = max.max(self.timestamps[index]);
            index = (index + 1) % RATE_BUFFER_SIZE;
            if index == self.data_end {
                break;
            }
        }
        max
    }

    pub fn count(&self) -> usize {
        if self.empty {
            0
        } else if self.data_end > self.data_start {
            self.data_end - self.data_start
        } else {
            RATE_BUFFER_SIZE - self.data_start + self.data_end
        }
    }

    /// Events per second across the window. Zero until the ring is full;
    /// effectively infinite when all timestamps coincide.
    pub fn rate(&self) -> f64 {
        let count = self.count();
        if count < RATE_BUFFER_SIZE {
            return 0.0;
        }
        let min = self.min_timestamp();
        let max = self.max_timestamp();
        if min == max {
            return INFINITE_RATE;
        }
        count as f64 / (max - min) as f64
    }
}

impl Default for RateCheckBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate-limiter state for one masternode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasternodeRateRecord {
    pub trigger_buffer: RateCheckBuffer,
    /// Cleared when the masternode exceeds the allowed rate; forces every
    /// later check down the full (non-bypassed) path.
    pub status_ok: bool,
}

impl Default for MasternodeRateRecord {
    fn default() -> Self {
        Self {
            trigger_buffer: RateCheckBuffer::new(),
            status_ok: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer = RateCheckBuffer::new();
        assert_eq!(buffer.count(), 0);
        assert_eq!(buffer.rate(), 0.0);
        assert_eq!(buffer.min_timestamp(), u64::MAX);
        assert_eq!(buffer.max_timestamp(), 0);
    }

    #[test]
    fn partial_buffer_has_zero_rate() {
        let mut buffer = RateCheckBuffer::new();
        for t in 0..(RATE_BUFFER_SIZE as u64 - 1) {
            buffer.add_timestamp(t);
        }
        assert_eq!(buffer.rate(), 0.0);
    }

    #[test]
    fn full_buffer_rate() {
        let mut buffer = RateCheckBuffer::new();
        for t in [100, 200, 300, 400, 500] {
            buffer.add_timestamp(t);
        }
        assert_eq!(buffer.count(), RATE_BUFFER_SIZE);
        assert!((buffer.rate() - 5.0 / 400.0).abs() < 1e-12);
    }

    #[test]
    fn overflow_keeps_most_recent() {
        let mut buffer = RateCheckBuffer::new();
        for t in [1, 2, 3, 4, 5, 6, 7] {
            buffer.add_timestamp(t);
        }
        // exactly the most recent RATE_BUFFER_SIZE are retained
        assert_eq!(buffer.count(), RATE_BUFFER_SIZE);
        assert_eq!(buffer.min_timestamp(), 3);
        assert_eq!(buffer.max_timestamp(), 7);
    }

    #[test]
    fn coincident_timestamps_are_infinite_rate() {
        let mut buffer = RateCheckBuffer::new();
        for _ in 0..RATE_BUFFER_SIZE {
            buffer.add_timestamp(42);
        }
        assert!(buffer.rate() >= 1.0e10);
    }

    #[test]
    fn round_trips_through_bincode() {
        let mut buffer = RateCheckBuffer::new();
        for t in [10, 20, 30] {
            buffer.add_timestamp(t);
        }
        let bytes = bincode::serialize(&buffer).unwrap();
        let restored: RateCheckBuffer = bincode::deserialize(&bytes).unwrap();
        assert_eq!(buffer, restored);
    }

    #[test]
    fn record_defaults_to_ok() {
        let record = MasternodeRateRecord::default();
        assert!(record.status_ok);
        assert_eq!(record.trigger_buffer.count(), 0);
    }
}
