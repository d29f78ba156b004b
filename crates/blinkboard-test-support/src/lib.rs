//! Test support utilities for blinkboard.
//!
//! Provides scripted port implementations and landmark builders so the
//! scanning loop can be driven frame by frame without a camera, a model or
//! a window.
//!
//! # Example
//!
//! ```
//! use blinkboard_test_support::{LandmarkBuilder, MockLandmarker};
//!
//! // Two frames with eyes open, then one with eyes closed.
//! let landmarker = MockLandmarker::from_ratios([Some(2.5), Some(2.5), Some(6.0)]);
//! let face = LandmarkBuilder::new().ratio(6.0).build();
//! assert_eq!(face.points().len(), 68);
//! # drop(landmarker);
//! ```

mod builders;
mod mocks;

pub use builders::{LandmarkBuilder, SyntheticFrame};
pub use mocks::{ManualClock, MockDisplay, MockFrameSource, MockLandmarker};
