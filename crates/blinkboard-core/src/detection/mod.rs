//! Face landmarking backed by the Candle networks.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::RgbImage;
use tracing::{debug, info};

use crate::domain::{BoundingBox, FaceLandmarks};
use crate::inference::{load_weights, select_device, BlazeFace, FaceBox, LandmarkRegressor};
use crate::ports::FaceLandmarker;

/// Default minimum detector confidence for a face.
pub const DEFAULT_MIN_FACE_CONFIDENCE: f32 = 0.75;

/// Settings for [`CandleLandmarker`].
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Faces scoring below this are ignored.
    pub min_face_confidence: f32,
    /// Path to the `BlazeFace` weights.
    pub face_model: PathBuf,
    /// Path to the 68-point landmark weights.
    pub landmark_model: PathBuf,
    /// Try a GPU device before the CPU.
    pub prefer_gpu: bool,
}

/// [`FaceLandmarker`] running `BlazeFace` then the landmark regressor.
pub struct CandleLandmarker {
    detector: BlazeFace,
    regressor: LandmarkRegressor,
    min_face_confidence: f32,
}

impl CandleLandmarker {
    /// Loads both networks.
    ///
    /// # Errors
    ///
    /// Returns an error if either weight file is missing or malformed.
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        let device = select_device(config.prefer_gpu);

        let detector = load_weights(&config.face_model, &device)
            .and_then(BlazeFace::new)
            .with_context(|| {
                format!("Failed to load face detector from {}", config.face_model.display())
            })?;
        let regressor = load_weights(&config.landmark_model, &device)
            .and_then(LandmarkRegressor::new)
            .with_context(|| {
                format!(
                    "Failed to load landmark model from {}",
                    config.landmark_model.display()
                )
            })?;
        info!("Landmark models loaded");

        Ok(Self {
            detector,
            regressor,
            min_face_confidence: config.min_face_confidence,
        })
    }
}

impl FaceLandmarker for CandleLandmarker {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<FaceLandmarks>> {
        let boxes = self.detector.detect(frame, self.min_face_confidence)?;
        debug!("Detector returned {} boxes", boxes.len());

        let mut faces = Vec::with_capacity(boxes.len());
        for face in boxes {
            let Some(bbox) = to_pixels(&face, frame.width(), frame.height()) else {
                continue;
            };
            let points = self.regressor.predict(frame, &bbox)?;
            faces.push(FaceLandmarks::new(bbox, face.score, points)?);
        }
        Ok(faces)
    }
}

/// Converts a normalized detector box to frame pixels, dropping empty boxes.
fn to_pixels(face: &FaceBox, width: u32, height: u32) -> Option<BoundingBox> {
    let [x0, y0, x1, y1] = face.bbox;
    let (w, h) = (width as f32, height as f32);
    let left = (x0 * w).round() as u32;
    let top = (y0 * h).round() as u32;
    let right = (x1 * w).round() as u32;
    let bottom = (y1 * h).round() as u32;
    (right > left && bottom > top).then(|| BoundingBox::new(left, top, right - left, bottom - top))
}
