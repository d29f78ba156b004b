//! Blink ratio: eye width over eye opening.
//!
//! For an eye contour `p0..p5` (corner, two upper-lid points, corner, two
//! lower-lid points) the ratio is `|p0 - p3| / |mid(p1, p2) - mid(p5, p4)|`.
//! The opening shrinks as the lid closes while the width stays roughly
//! constant, so a larger ratio means a more closed eye.

use serde::Serialize;

use super::{Eye, FaceLandmarks, Point};

/// Blink ratio of one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlinkRatio {
    /// Ratio for the left eye.
    pub left: f32,
    /// Ratio for the right eye.
    pub right: f32,
}

impl BlinkRatio {
    /// Mean of both eyes; the value compared against the blink threshold.
    #[must_use]
    pub fn value(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// Measures both eyes of a face.
    ///
    /// Returns `None` when either eye has no measurable opening.
    #[must_use]
    pub fn measure(face: &FaceLandmarks) -> Option<Self> {
        let left = eye_ratio(&face.eye(Eye::Left))?;
        let right = eye_ratio(&face.eye(Eye::Right))?;
        Some(Self { left, right })
    }
}

/// Ratio for a single eye contour.
///
/// Returns `None` when the lid midpoints coincide, or the result is not finite.
#[must_use]
pub fn eye_ratio(eye: &[Point; 6]) -> Option<f32> {
    let horizontal = eye[0].distance(eye[3]);

    let top = eye[1].midpoint(eye[2]);
    let bottom = eye[5].midpoint(eye[4]);
    let vertical = top.distance(bottom);

    if vertical <= 0.0 {
        return None;
    }

    let ratio = horizontal / vertical;
    ratio.is_finite().then_some(ratio)
}
