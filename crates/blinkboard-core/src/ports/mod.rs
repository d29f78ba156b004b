//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the scanning loop and the
//! camera, the landmark model, the windows and the clock.

mod clock;
mod display;
mod frame_source;
mod landmarker;

pub use clock::{Clock, SystemClock};
pub use display::{Display, Surface};
pub use frame_source::FrameSource;
pub use landmarker::FaceLandmarker;
