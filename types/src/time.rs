//! Logical time used by the debate window.
//!
//! Time is measured in ticks supplied by the host environment (block
//! heights, slots or seconds); the engine only compares and adds them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in host time, in ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub fn as_ticks(&self) -> u64 {
        self.0
    }

    /// `self + ticks`, or `None` on overflow.
    pub fn checked_add(self, ticks: u64) -> Option<Self> {
        self.0.checked_add(ticks).map(Self)
    }

    /// Whether `now` has reached this timestamp.
    pub fn has_passed(&self, now: Timestamp) -> bool {
        now >= *self
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
