//! Physical (wall-clock) time.
//!
//! Timestamps are Unix milliseconds. Durations used for expiration windows
//! are expressed with the constants below rather than `std::time::Duration`
//! so they serialize as plain integers in persisted records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds per second
pub const MS_PER_SECOND: u64 = 1_000;
/// Milliseconds per minute
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
/// Milliseconds per hour
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
/// Milliseconds per day
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Wall-clock timestamp in Unix milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalTime {
    /// Milliseconds since the Unix epoch
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// Create a timestamp from Unix milliseconds
    pub const fn from_ms(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero when
    /// `earlier` lies in the future (clock skew after a restore).
    pub fn elapsed_since(self, earlier: PhysicalTime) -> u64 {
        self.ts_ms.saturating_sub(earlier.ts_ms)
    }

    /// Whether more than `window_ms` has passed between `earlier` and `self`.
    pub fn exceeds_window(self, earlier: PhysicalTime, window_ms: u64) -> bool {
        self.elapsed_since(earlier) > window_ms
    }
}

impl fmt::Display for PhysicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.ts_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_saturates() {
        let now = PhysicalTime::from_ms(1_000);
        assert_eq!(now.elapsed_since(PhysicalTime::from_ms(400)), 600);
        assert_eq!(now.elapsed_since(PhysicalTime::from_ms(5_000)), 0);
    }

    #[test]
    fn test_window_is_strict() {
        let start = PhysicalTime::from_ms(0);
        assert!(!PhysicalTime::from_ms(MS_PER_DAY).exceeds_window(start, MS_PER_DAY));
        assert!(PhysicalTime::from_ms(MS_PER_DAY + 1).exceeds_window(start, MS_PER_DAY));
    }
}
