//! Core library for blink-driven scanning text entry.
//!
//! A webcam frame goes through face and landmark detection, the eye aspect
//! ratio feeds a blink debouncer, and a debounced blink types whichever key
//! the scanning cursor currently highlights.
//!
//! The camera, windows, clock and landmark model sit behind the traits in
//! [`ports`], so the loop in [`pipeline`] runs unchanged against mocks.

pub mod detection;
pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod ports;
pub mod render;
pub mod session;

pub use detection::{CandleLandmarker, DetectorConfig, DEFAULT_MIN_FACE_CONFIDENCE};
pub use pipeline::{run, step, Flow, Ports, RunSummary};
pub use session::{FaceSelection, Session, SessionConfig, StepReport};
