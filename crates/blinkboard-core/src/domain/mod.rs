//! Core domain types for blink-driven scanning input.

mod debounce;
mod geometry;
mod landmarks;
mod layout;
mod ratio;
mod scan;
mod text;

pub use debounce::{
    BlinkDebouncer, BlinkOutcome, BlinkState, DEFAULT_BLINK_THRESHOLD, DEFAULT_FRAMES_TO_TRIGGER,
};
pub use geometry::{BoundingBox, Point};
pub use landmarks::{Eye, FaceLandmarks, LANDMARK_COUNT, LEFT_EYE, RIGHT_EYE};
pub use layout::{KeyCell, KeyLayout, DEFAULT_COLUMNS, DEFAULT_KEYS, KEY_SIZE};
pub use ratio::{eye_ratio, BlinkRatio};
pub use scan::{ScanCursor, ScanTimer, DEFAULT_SCAN_INTERVAL};
pub use text::{wrap, OutputText};
