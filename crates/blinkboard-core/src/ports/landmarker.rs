//! Face landmark detection port.

use image::RgbImage;

use crate::domain::FaceLandmarks;

/// Port for locating faces and their 68 landmarks in a frame.
pub trait FaceLandmarker: Send + Sync {
    /// Detects all faces in `frame`.
    ///
    /// Landmarks are returned in `frame` pixel coordinates. An empty vector
    /// means no face was found.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn detect(&self, frame: &RgbImage) -> anyhow::Result<Vec<FaceLandmarks>>;
}
