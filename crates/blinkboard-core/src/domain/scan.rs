//! Round-robin scan cursor and the timer that advances it.

use std::time::{Duration, Instant};

/// Default time each key stays highlighted.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(3);

/// Index of the highlighted key, wrapping at the layout size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    index: usize,
    len: usize,
}

impl ScanCursor {
    /// Cursor at the first of `len` keys.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len: len.max(1),
        }
    }

    /// Currently highlighted index, always in `0..len`.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Moves to the next key, wrapping to zero after the last.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.len;
    }
}

/// Advances the cursor once per elapsed interval.
///
/// The reference point is reset to the observed time on every advance, so
/// per-frame latency accumulates as drift. At most one step is taken per
/// tick no matter how many intervals have passed.
#[derive(Debug, Clone)]
pub struct ScanTimer {
    interval: Duration,
    last_advance: Instant,
}

impl ScanTimer {
    /// Timer whose first interval starts at `start`.
    #[must_use]
    pub const fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_advance: start,
        }
    }

    /// Configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Advances `cursor` if the interval has elapsed at `now`.
    ///
    /// Returns whether the cursor moved.
    pub fn tick(&mut self, now: Instant, cursor: &mut ScanCursor) -> bool {
        if now.saturating_duration_since(self.last_advance) < self.interval {
            return false;
        }
        cursor.advance();
        self.last_advance = now;
        true
    }
}
