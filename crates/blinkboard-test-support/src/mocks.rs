//! Mock implementations of core port traits.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use blinkboard_core::domain::FaceLandmarks;
use blinkboard_core::ports::{Clock, Display, FaceLandmarker, FrameSource, Surface};
use image::RgbImage;

use crate::builders::{LandmarkBuilder, SyntheticFrame};

/// Mock implementation of `FrameSource` for testing.
///
/// Yields gray frames and records how often it was released.
pub struct MockFrameSource {
    width: u32,
    height: u32,
    fail_after: Option<u64>,
    frames: u64,
    releases: u32,
}

impl MockFrameSource {
    /// Creates a source of 640x480 frames.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_size(640, 480)
    }

    /// Creates a source of `width`x`height` frames.
    #[must_use]
    pub const fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail_after: None,
            frames: 0,
            releases: 0,
        }
    }

    /// Fails every read after `frames` successful ones.
    #[must_use]
    pub const fn failing_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Frames handed out so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of `release` calls.
    #[must_use]
    pub const fn releases(&self) -> u32 {
        self.releases
    }
}

impl Default for MockFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockFrameSource {
    fn next_frame(&mut self) -> anyhow::Result<RgbImage> {
        if self.fail_after.is_some_and(|limit| self.frames >= limit) {
            anyhow::bail!("mock camera unplugged");
        }
        self.frames += 1;
        Ok(SyntheticFrame::gray(self.width, self.height))
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.releases += 1;
        Ok(())
    }
}

/// One scripted detection result.
enum Scripted {
    Faces(Vec<FaceLandmarks>),
    Error(String),
}

/// Mock implementation of `FaceLandmarker` for testing.
///
/// Returns scripted results in order, then no faces once the script runs out.
pub struct MockLandmarker {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<u64>,
    frame_sizes: Mutex<Vec<(u32, u32)>>,
}

impl MockLandmarker {
    /// Creates a landmarker that never finds a face.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
            frame_sizes: Mutex::new(Vec::new()),
        }
    }

    /// One face per frame with the given ratio, or no face for `None`.
    #[must_use]
    pub fn from_ratios(ratios: impl IntoIterator<Item = Option<f32>>) -> Self {
        let mock = Self::new();
        for ratio in ratios {
            let faces = ratio
                .map(|r| vec![LandmarkBuilder::new().ratio(r).build()])
                .unwrap_or_default();
            mock.push_faces(faces);
        }
        mock
    }

    /// Appends a frame result.
    pub fn push_faces(&self, faces: Vec<FaceLandmarks>) {
        self.lock_script().push_back(Scripted::Faces(faces));
    }

    /// Appends a failing frame.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock_script().push_back(Scripted::Error(message.into()));
    }

    /// Number of `detect` calls.
    #[must_use]
    pub fn calls(&self) -> u64 {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dimensions of every frame passed to `detect`.
    #[must_use]
    pub fn frame_sizes(&self) -> Vec<(u32, u32)> {
        self.frame_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockLandmarker {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceLandmarker for MockLandmarker {
    fn detect(&self, frame: &RgbImage) -> anyhow::Result<Vec<FaceLandmarks>> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.frame_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.dimensions());

        match self.lock_script().pop_front() {
            Some(Scripted::Faces(faces)) => Ok(faces),
            Some(Scripted::Error(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// Mock implementation of `Display` for testing.
///
/// Records every surface shown and requests exit on a chosen poll.
pub struct MockDisplay {
    exit_on_poll: Option<u64>,
    polls: u64,
    shown: Vec<(Surface, (u32, u32))>,
    last: Vec<(Surface, RgbImage)>,
}

impl MockDisplay {
    /// A display that never asks to exit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            exit_on_poll: None,
            polls: 0,
            shown: Vec::new(),
            last: Vec::new(),
        }
    }

    /// A display whose `poll`-th poll (1-based) reports ESC.
    #[must_use]
    pub const fn exit_after(poll: u64) -> Self {
        let mut display = Self::new();
        display.exit_on_poll = Some(poll);
        display
    }

    /// Number of polls so far.
    #[must_use]
    pub const fn polls(&self) -> u64 {
        self.polls
    }

    /// Every `(surface, dimensions)` shown, in order.
    #[must_use]
    pub fn shown(&self) -> &[(Surface, (u32, u32))] {
        &self.shown
    }

    /// Most recent image shown on `surface`.
    #[must_use]
    pub fn last(&self, surface: Surface) -> Option<&RgbImage> {
        self.last
            .iter()
            .find(|(s, _)| *s == surface)
            .map(|(_, image)| image)
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MockDisplay {
    fn show(&mut self, surface: Surface, image: &RgbImage) -> anyhow::Result<()> {
        self.shown.push((surface, image.dimensions()));
        self.last.retain(|(s, _)| *s != surface);
        self.last.push((surface, image.clone()));
        Ok(())
    }

    fn poll_exit(&mut self) -> anyhow::Result<bool> {
        self.polls += 1;
        Ok(self.exit_on_poll.is_some_and(|n| self.polls >= n))
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    start: Instant,
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            now: Mutex::new(start),
        }
    }

    /// Instant the clock started at.
    #[must_use]
    pub const fn start(&self) -> Instant {
        self.start
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_source_fails_after_limit() {
        let mut source = MockFrameSource::new().failing_after(1);
        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_err());
        assert_eq!(source.frames(), 1);
    }

    #[test]
    fn test_landmarker_script_then_empty() {
        let landmarker = MockLandmarker::from_ratios([Some(5.0), None]);
        landmarker.push_error("boom");
        let frame = RgbImage::new(4, 4);

        assert_eq!(landmarker.detect(&frame).map(|f| f.len()).ok(), Some(1));
        assert_eq!(landmarker.detect(&frame).map(|f| f.len()).ok(), Some(0));
        assert!(landmarker.detect(&frame).is_err());
        assert_eq!(landmarker.detect(&frame).map(|f| f.len()).ok(), Some(0));
        assert_eq!(landmarker.calls(), 4);
    }

    #[test]
    fn test_display_exits_on_requested_poll() {
        let mut display = MockDisplay::exit_after(2);
        assert_eq!(display.poll_exit().ok(), Some(false));
        assert_eq!(display.poll_exit().ok(), Some(true));
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(3));
        assert_eq!(clock.now() - clock.start(), Duration::from_secs(3));
    }
}
