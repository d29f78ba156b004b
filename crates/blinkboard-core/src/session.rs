//! Per-run state of the scanning keyboard.

use std::time::{Duration, Instant};

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{
    BlinkDebouncer, BlinkOutcome, BlinkRatio, FaceLandmarks, KeyLayout, OutputText, ScanCursor,
    ScanTimer, DEFAULT_BLINK_THRESHOLD, DEFAULT_FRAMES_TO_TRIGGER, DEFAULT_SCAN_INTERVAL,
};
use crate::render::{render_keyboard_into, BoardConfig, TextBoard};

/// How several faces in one frame feed the debouncer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSelection {
    /// Every face, in detection order.
    #[default]
    All,
    /// Only the face with the largest bounding box.
    Largest,
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Time each key stays highlighted.
    pub scan_interval: Duration,
    /// Ratio above which a frame counts as closed.
    pub blink_threshold: f32,
    /// Consecutive closed frames needed to type a key.
    pub frames_to_trigger: u32,
    /// Multi-face policy.
    pub face_selection: FaceSelection,
    /// Factor applied to each captured frame before detection.
    pub frame_scale: f32,
    /// Text board layout.
    pub board: BoardConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            blink_threshold: DEFAULT_BLINK_THRESHOLD,
            frames_to_trigger: DEFAULT_FRAMES_TO_TRIGGER,
            face_selection: FaceSelection::All,
            frame_scale: 0.5,
            board: BoardConfig::default(),
        }
    }
}

/// What happened during one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// The scan cursor moved this frame.
    pub advanced: bool,
    /// Label of the highlighted key after the update.
    pub active: char,
    /// Blink ratio of the last measured face, if any.
    pub ratio: Option<f32>,
    /// The last measured ratio was above threshold.
    pub blinking: bool,
    /// Key typed this frame, if any.
    pub committed: Option<char>,
}

/// Scan cursor, debounce counter, typed text and canvases of one run.
pub struct Session {
    config: SessionConfig,
    layout: KeyLayout,
    cursor: ScanCursor,
    timer: ScanTimer,
    debouncer: BlinkDebouncer,
    text: OutputText,
    board: TextBoard,
    keyboard: RgbImage,
    frames: u64,
    commits: u64,
}

impl Session {
    /// Starts a session; the first scan interval begins at `now`.
    #[must_use]
    pub fn new(config: SessionConfig, layout: KeyLayout, now: Instant) -> Self {
        let (width, height) = layout.canvas_size();
        Self {
            cursor: ScanCursor::new(layout.len()),
            timer: ScanTimer::new(config.scan_interval, now),
            debouncer: BlinkDebouncer::new(config.blink_threshold, config.frames_to_trigger),
            text: OutputText::new(),
            board: TextBoard::new(config.board.clone()),
            keyboard: RgbImage::new(width, height),
            frames: 0,
            commits: 0,
            config,
            layout,
        }
    }

    /// Returns the session to its initial state, starting a new interval at `now`.
    pub fn reset(&mut self, now: Instant) {
        let config = self.config.clone();
        let layout = self.layout.clone();
        *self = Self::new(config, layout, now);
    }

    /// Session tunables.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Key layout being scanned.
    #[must_use]
    pub const fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// Index of the highlighted key.
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.cursor.index()
    }

    /// Label of the highlighted key.
    #[must_use]
    pub fn active_key(&self) -> char {
        self.layout.label(self.cursor.index()).unwrap_or(' ')
    }

    /// Current debounce run length.
    #[must_use]
    pub const fn blink_counter(&self) -> u32 {
        self.debouncer.counter()
    }

    /// Text typed so far.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Frames processed by [`Self::update`].
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Keys typed so far.
    #[must_use]
    pub const fn commits(&self) -> u64 {
        self.commits
    }

    /// Advances the scan timer and feeds this frame's faces to the debouncer.
    ///
    /// Faces without a measurable ratio, and frames without faces, leave the
    /// debounce counter untouched.
    pub fn update(&mut self, faces: &[FaceLandmarks], now: Instant) -> StepReport {
        self.frames += 1;

        let advanced = self.timer.tick(now, &mut self.cursor);
        if advanced {
            debug!("Scan moved to {:?}", self.active_key());
        }

        let mut ratio = None;
        let mut committed = None;
        for face in self.selected_faces(faces) {
            let Some(measured) = BlinkRatio::measure(face) else {
                debug!("Skipping face without measurable eye opening");
                continue;
            };
            let value = measured.value();
            ratio = Some(value);

            match self.debouncer.observe(value) {
                BlinkOutcome::Commit => {
                    let key = self.active_key();
                    self.text.push(key);
                    self.commits += 1;
                    committed = Some(key);
                    info!("Typed {:?}, text is now {:?}", key, self.text.as_str());
                }
                BlinkOutcome::Accumulating(n) => debug!("Blink frame {n} (ratio {value:.2})"),
                BlinkOutcome::Reset => {}
            }
        }

        StepReport {
            advanced,
            active: self.active_key(),
            ratio,
            blinking: ratio.is_some_and(|r| self.debouncer.is_closed(r)),
            committed,
        }
    }

    /// Draws the keyboard with the current key highlighted.
    pub fn render_keyboard(&mut self) -> &RgbImage {
        render_keyboard_into(&mut self.keyboard, &self.layout, self.cursor.index());
        &self.keyboard
    }

    /// Draws the typed text on the board.
    pub fn render_board(&mut self) -> &RgbImage {
        self.board.render(self.text.as_str())
    }

    fn selected_faces<'a>(&self, faces: &'a [FaceLandmarks]) -> Vec<&'a FaceLandmarks> {
        match self.config.face_selection {
            FaceSelection::All => faces.iter().collect(),
            FaceSelection::Largest => faces.iter().max_by_key(|f| f.bbox.area()).into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundingBox, Point, LANDMARK_COUNT};

    /// Face whose eyes have exactly the given ratio.
    fn face_with_ratio(ratio: f32, size: u32) -> FaceLandmarks {
        let mut points = vec![Point::default(); LANDMARK_COUNT];
        let gap = 30.0 / ratio;
        for base in [36, 42] {
            points[base] = Point::new(0.0, 0.0);
            points[base + 1] = Point::new(10.0, -gap / 2.0);
            points[base + 2] = Point::new(20.0, -gap / 2.0);
            points[base + 3] = Point::new(30.0, 0.0);
            points[base + 4] = Point::new(20.0, gap / 2.0);
            points[base + 5] = Point::new(10.0, gap / 2.0);
        }
        FaceLandmarks::new(BoundingBox::new(0, 0, size, size), 1.0, points)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    fn closed_eye_face() -> FaceLandmarks {
        let mut points = vec![Point::default(); LANDMARK_COUNT];
        points[39] = Point::new(30.0, 0.0);
        points[45] = Point::new(30.0, 0.0);
        FaceLandmarks::new(BoundingBox::default(), 1.0, points).unwrap_or_else(|e| panic!("{e}"))
    }

    fn session_on(key: char, now: Instant) -> Session {
        let layout = KeyLayout::new([key, 'Z'], 2).unwrap_or_default();
        Session::new(SessionConfig::default(), layout, now)
    }

    fn feed(session: &mut Session, ratios: &[f32], now: Instant) -> Vec<StepReport> {
        ratios
            .iter()
            .map(|&r| session.update(&[face_with_ratio(r, 100)], now))
            .collect()
    }

    #[test]
    fn test_five_closed_frames_type_active_key() {
        let now = Instant::now();
        let mut session = session_on('A', now);

        let reports = feed(&mut session, &[5.0, 5.0, 5.0, 5.0, 5.0], now);

        assert_eq!(session.text(), "A");
        assert_eq!(session.blink_counter(), 0);
        assert_eq!(reports[4].committed, Some('A'));
        assert!(reports[..4].iter().all(|r| r.committed.is_none()));
    }

    #[test]
    fn test_broken_run_types_nothing() {
        let now = Instant::now();
        let mut session = session_on('A', now);

        feed(&mut session, &[5.0, 5.0, 3.0, 5.0, 5.0], now);

        assert_eq!(session.text(), "");
        assert_eq!(session.blink_counter(), 2);
    }

    #[test]
    fn test_no_faces_is_noop() {
        let now = Instant::now();
        let mut session = session_on('A', now);
        feed(&mut session, &[5.0, 5.0], now);

        let report = session.update(&[], now);

        assert_eq!(report.ratio, None);
        assert!(!report.blinking);
        assert_eq!(session.blink_counter(), 2);
    }

    #[test]
    fn test_unmeasurable_face_is_noop() {
        let now = Instant::now();
        let mut session = session_on('A', now);
        feed(&mut session, &[5.0, 5.0, 5.0], now);

        let report = session.update(&[closed_eye_face()], now);

        assert_eq!(report.ratio, None);
        assert_eq!(session.blink_counter(), 3);
    }

    #[test]
    fn test_commit_uses_key_active_at_commit_time() {
        let start = Instant::now();
        let mut session = session_on('A', start);
        feed(&mut session, &[5.0, 5.0, 5.0, 5.0], start);

        // Cursor moves to 'Z' on the frame that completes the run.
        let later = start + Duration::from_secs(3);
        let report = session.update(&[face_with_ratio(5.0, 100)], later);

        assert!(report.advanced);
        assert_eq!(report.committed, Some('Z'));
        assert_eq!(session.text(), "Z");
    }

    #[test]
    fn test_scan_is_independent_of_blinks() {
        let start = Instant::now();
        let mut session = Session::new(SessionConfig::default(), KeyLayout::default(), start);

        for step in 1..=4u32 {
            let now = start + Duration::from_secs(3) * step;
            let report = session.update(&[face_with_ratio(5.0, 100)], now);
            assert!(report.advanced);
        }
        assert_eq!(session.active_index(), 4);
        assert_eq!(session.active_key(), '5');
    }

    #[test]
    fn test_all_faces_feed_debouncer() {
        let now = Instant::now();
        let mut session = session_on('A', now);
        let faces = [face_with_ratio(5.0, 100), face_with_ratio(5.0, 50)];

        session.update(&faces, now);
        session.update(&faces, now);

        assert_eq!(session.blink_counter(), 4);
    }

    #[test]
    fn test_largest_face_only() {
        let now = Instant::now();
        let config = SessionConfig {
            face_selection: FaceSelection::Largest,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, KeyLayout::default(), now);
        let faces = [face_with_ratio(3.0, 50), face_with_ratio(5.0, 200)];

        let report = session.update(&faces, now);

        assert_eq!(session.blink_counter(), 1);
        assert!(report.ratio.is_some_and(|r| (r - 5.0).abs() < 1e-4));
    }

    #[test]
    fn test_last_face_sets_reported_ratio() {
        let now = Instant::now();
        let mut session = session_on('A', now);
        let faces = [face_with_ratio(5.0, 100), face_with_ratio(3.0, 100)];

        let report = session.update(&faces, now);

        assert!(report.ratio.is_some_and(|r| (r - 3.0).abs() < 1e-4));
        assert!(!report.blinking);
        assert_eq!(session.blink_counter(), 0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let start = Instant::now();
        let mut session = session_on('A', start);
        feed(&mut session, &[5.0; 7], start + Duration::from_secs(3));
        assert_eq!(session.text(), "Z");

        session.reset(start);

        assert_eq!(session.text(), "");
        assert_eq!(session.active_index(), 0);
        assert_eq!(session.blink_counter(), 0);
        assert_eq!(session.frames(), 0);
    }

    #[test]
    fn test_render_surfaces() {
        let now = Instant::now();
        let mut session = Session::new(SessionConfig::default(), KeyLayout::default(), now);
        assert_eq!(session.render_keyboard().dimensions(), (1200, 500));
        assert_eq!(session.render_board().dimensions(), (1000, 500));
    }
}
