//! Nullable clock: deterministic time for testing.

use agora_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Shareable across threads so a
/// scripted call target can read the same clock as the test driving it.
#[derive(Debug, Default)]
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_ticks: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_ticks),
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }

    /// Advance time by a number of ticks, saturating at the end of time.
    pub fn advance(&self, ticks: u64) -> Timestamp {
        let previous = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                Some(c.saturating_add(ticks))
            })
            .unwrap_or_else(|c| c);
        Timestamp::new(previous.saturating_add(ticks))
    }

    /// Set the time to a specific value.
    pub fn set(&self, ticks: u64) {
        self.current.store(ticks, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_set() {
        let clock = NullClock::new(10);
        assert_eq!(clock.now(), Timestamp::new(10));
        assert_eq!(clock.advance(5), Timestamp::new(15));
        clock.set(3);
        assert_eq!(clock.now(), Timestamp::new(3));
    }

    #[test]
    fn advance_saturates() {
        let clock = NullClock::new(u64::MAX - 1);
        assert_eq!(clock.advance(10), Timestamp::new(u64::MAX));
    }
}
