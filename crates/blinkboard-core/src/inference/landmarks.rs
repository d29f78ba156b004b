//! 68-point facial landmark regressor.
//!
//! A plain convolutional network: four conv/ReLU/max-pool stages on a
//! 112x112 grayscale face crop, then two dense layers that emit 68 `(x, y)`
//! pairs normalized to the crop.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};
use image::imageops::FilterType;
use image::RgbImage;

use crate::domain::{BoundingBox, Point, LANDMARK_COUNT};

/// Side of the square crop fed to the network.
pub const CROP_SIZE: usize = 112;

/// Fraction of the face box added on every side before cropping.
pub const CROP_MARGIN: f32 = 0.1;

const STAGES: [(usize, usize); 4] = [(1, 32), (32, 64), (64, 128), (128, 256)];
const HIDDEN: usize = 512;
const POOLED_SIDE: usize = CROP_SIZE >> STAGES.len();

/// Landmark regressor network.
pub struct LandmarkRegressor {
    convs: Vec<Conv2d>,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl LandmarkRegressor {
    /// Builds the network from loaded weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let same = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };
        let convs = STAGES
            .iter()
            .enumerate()
            .map(|(i, &(in_c, out_c))| conv2d(in_c, out_c, 3, same, vb.pp(format!("conv{}", i + 1))))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let last = STAGES[STAGES.len() - 1].1;
        Ok(Self {
            convs,
            fc1: linear(last * POOLED_SIDE * POOLED_SIDE, HIDDEN, vb.pp("fc1"))?,
            fc2: linear(HIDDEN, LANDMARK_COUNT * 2, vb.pp("fc2"))?,
            device: vb.device().clone(),
        })
    }

    /// Predicts 68 landmarks for the face in `face`, in `frame` pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the crop is empty or inference fails.
    pub fn predict(&self, frame: &RgbImage, face: &BoundingBox) -> Result<Vec<Point>> {
        let region = crop_region(face, frame.width(), frame.height())
            .context("Face box lies outside the frame")?;
        let input = self.to_input(frame, &region)?;

        let mut h = input;
        for conv in &self.convs {
            h = conv.forward(&h)?.relu()?.max_pool2d(2)?;
        }
        let h = h.flatten_from(1)?;
        let h = self.fc1.forward(&h)?.relu()?;
        let coords = self.fc2.forward(&h)?.squeeze(0)?.to_vec1::<f32>()?;

        Ok(to_frame_points(&coords, &region))
    }

    fn to_input(&self, frame: &RgbImage, region: &BoundingBox) -> Result<Tensor> {
        let crop =
            image::imageops::crop_imm(frame, region.x, region.y, region.width, region.height)
                .to_image();
        let gray = image::imageops::grayscale(&crop);
        let side = CROP_SIZE as u32;
        let resized = image::imageops::resize(&gray, side, side, FilterType::Triangle);
        let data: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 255.0)
            .collect();
        Tensor::from_vec(data, (1, 1, CROP_SIZE, CROP_SIZE), &self.device)
            .context("Failed to build landmark input")
    }
}

/// Expands `face` by [`CROP_MARGIN`] and clips it to the frame.
///
/// Returns `None` when nothing of the box is inside the frame.
#[must_use]
pub fn crop_region(face: &BoundingBox, frame_width: u32, frame_height: u32) -> Option<BoundingBox> {
    let margin_x = face.width as f32 * CROP_MARGIN;
    let margin_y = face.height as f32 * CROP_MARGIN;

    let x0 = (face.x as f32 - margin_x).max(0.0) as u32;
    let y0 = (face.y as f32 - margin_y).max(0.0) as u32;
    let x1 = ((face.x + face.width) as f32 + margin_x).min(frame_width as f32) as u32;
    let y1 = ((face.y + face.height) as f32 + margin_y).min(frame_height as f32) as u32;

    (x1 > x0 && y1 > y0).then(|| BoundingBox::new(x0, y0, x1 - x0, y1 - y0))
}

fn to_frame_points(coords: &[f32], region: &BoundingBox) -> Vec<Point> {
    let (w, h) = (region.width as f32, region.height as f32);
    coords
        .chunks_exact(2)
        .map(|xy| Point::new(region.x as f32 + xy[0] * w, region.y as f32 + xy[1] * h))
        .collect()
}
