//! Tracks how long the receiver has gone without a packet of interest

use std::time::Duration;

/// Pure timeout state machine fed with explicit nanosecond timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutTracker {
    threshold: u64,
    last_reset: u64,
    last_timestamp: u64,
}

impl TimeoutTracker {
    /// Returns a tracker reset at `now`. A zero threshold never expires.
    pub fn new(threshold: Duration, now: u64) -> Self {
        Self {
            threshold: u64::try_from(threshold.as_nanos()).unwrap_or(u64::MAX),
            last_reset: now,
            last_timestamp: now,
        }
    }

    /// Records the time of the latest wake up
    pub fn timestamp(&mut self, now: u64) {
        self.last_timestamp = now;
    }

    /// Restarts the timeout period at the latest recorded timestamp
    pub fn reset(&mut self) {
        self.last_reset = self.last_timestamp;
    }

    /// True once the threshold has elapsed since the last reset
    pub fn expired(&self) -> bool {
        self.threshold != 0
            && self.last_timestamp.saturating_sub(self.last_reset)
                >= self.threshold
    }

    /// Latest recorded timestamp
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }
}

#[cfg(test)]
#[path = "./timeout_tests.rs"]
mod tests;
