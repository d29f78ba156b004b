//! 68-point facial landmarks (iBUG ordering).

use serde::Serialize;

use super::{BoundingBox, Point};

/// Number of landmarks predicted per face.
pub const LANDMARK_COUNT: usize = 68;

/// Landmark indices outlining the left eye, outer corner first.
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];

/// Landmark indices outlining the right eye, inner corner first.
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// Which eye to read from a landmark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    /// Subject's left eye (landmarks 36-41).
    Left,
    /// Subject's right eye (landmarks 42-47).
    Right,
}

impl Eye {
    /// Landmark indices for this eye.
    #[must_use]
    pub const fn indices(self) -> [usize; 6] {
        match self {
            Self::Left => LEFT_EYE,
            Self::Right => RIGHT_EYE,
        }
    }
}

/// A detected face with its landmarks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceLandmarks {
    /// Face bounding box in frame pixels.
    pub bbox: BoundingBox,
    /// Detection confidence (0.0 to 1.0).
    pub confidence: f32,
    points: Vec<Point>,
}

impl FaceLandmarks {
    /// Creates a landmark set.
    ///
    /// # Errors
    ///
    /// Returns an error if `points` does not hold exactly [`LANDMARK_COUNT`] entries.
    pub fn new(bbox: BoundingBox, confidence: f32, points: Vec<Point>) -> anyhow::Result<Self> {
        if points.len() != LANDMARK_COUNT {
            anyhow::bail!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                points.len()
            );
        }
        Ok(Self {
            bbox,
            confidence,
            points,
        })
    }

    /// All landmark positions in frame pixels.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The six contour points of one eye, in landmark order.
    #[must_use]
    pub fn eye(&self, eye: Eye) -> [Point; 6] {
        eye.indices().map(|i| self.points[i])
    }
}
