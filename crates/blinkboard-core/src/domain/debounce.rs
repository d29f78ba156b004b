//! Consecutive-frame blink debounce.

/// Default ratio above which an eye counts as closed.
pub const DEFAULT_BLINK_THRESHOLD: f32 = 4.25;

/// Default number of consecutive closed frames that make a key press.
pub const DEFAULT_FRAMES_TO_TRIGGER: u32 = 5;

/// Observable state of the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    /// No closed frames counted.
    Open,
    /// Counting a run of closed frames.
    Accumulating(u32),
}

/// Result of feeding one ratio to the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkOutcome {
    /// Ratio at or below threshold; any run was discarded.
    Reset,
    /// Ratio above threshold; run length so far.
    Accumulating(u32),
    /// Run reached the trigger length. The counter is back at zero.
    Commit,
}

/// Counts consecutive above-threshold frames.
///
/// A single frame at or below the threshold discards the whole run.
#[derive(Debug, Clone)]
pub struct BlinkDebouncer {
    threshold: f32,
    frames_to_trigger: u32,
    counter: u32,
}

impl BlinkDebouncer {
    /// Creates a debouncer. A trigger of zero is treated as one.
    #[must_use]
    pub fn new(threshold: f32, frames_to_trigger: u32) -> Self {
        Self {
            threshold,
            frames_to_trigger: frames_to_trigger.max(1),
            counter: 0,
        }
    }

    /// Ratio threshold.
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Current run length.
    #[must_use]
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BlinkState {
        match self.counter {
            0 => BlinkState::Open,
            n => BlinkState::Accumulating(n),
        }
    }

    /// Whether `ratio` counts as a closed-eye frame.
    #[must_use]
    pub fn is_closed(&self, ratio: f32) -> bool {
        ratio > self.threshold
    }

    /// Feeds one frame's ratio.
    pub fn observe(&mut self, ratio: f32) -> BlinkOutcome {
        if !self.is_closed(ratio) {
            self.counter = 0;
            return BlinkOutcome::Reset;
        }

        self.counter += 1;
        if self.counter >= self.frames_to_trigger {
            self.counter = 0;
            BlinkOutcome::Commit
        } else {
            BlinkOutcome::Accumulating(self.counter)
        }
    }
}

impl Default for BlinkDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_BLINK_THRESHOLD, DEFAULT_FRAMES_TO_TRIGGER)
    }
}
