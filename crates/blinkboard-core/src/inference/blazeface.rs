//! `BlazeFace` short-range face detector.
//!
//! Weights follow the layout of hollance/BlazeFace-PyTorch with batch norm
//! folded into the convolution biases.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::imageops::FilterType;
use image::RgbImage;

use super::sigmoid;

/// Side of the square network input.
const INPUT_SIZE: usize = 128;

const NMS_IOU: f32 = 0.3;

/// `(in, out, stride)` for every block; kernels are all 3x3.
const BACKBONE_16: [(usize, usize, usize); 11] = [
    (24, 24, 1),
    (24, 28, 1),
    (28, 32, 2),
    (32, 36, 1),
    (36, 42, 1),
    (42, 48, 2),
    (48, 56, 1),
    (56, 64, 1),
    (64, 72, 1),
    (72, 80, 1),
    (80, 88, 1),
];

const BACKBONE_8: [(usize, usize, usize); 5] = [
    (88, 96, 2),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
];

/// Anchor grids: `(cells per side, anchors per cell)`.
const GRIDS: [(usize, usize); 2] = [(16, 2), (8, 6)];

/// A face box in normalized `[0, 1]` frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    /// `[x_min, y_min, x_max, y_max]`.
    pub bbox: [f32; 4],
    /// Detector confidence after the sigmoid.
    pub score: f32,
}

struct Block {
    depthwise: Conv2d,
    pointwise: Conv2d,
    extra_channels: usize,
    stride: usize,
}

impl Block {
    fn load(in_c: usize, out_c: usize, stride: usize, vb: &VarBuilder) -> Result<Self> {
        let depthwise = conv2d(
            in_c,
            in_c,
            3,
            Conv2dConfig {
                stride,
                padding: usize::from(stride == 1),
                groups: in_c,
                ..Conv2dConfig::default()
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d(in_c, out_c, 1, Conv2dConfig::default(), vb.pp("pointwise"))?;
        Ok(Self {
            depthwise,
            pointwise,
            extra_channels: out_c.saturating_sub(in_c),
            stride,
        })
    }
}

impl Module for Block {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (input, shortcut) = if self.stride == 2 {
            let padded = x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?;
            (padded, x.max_pool2d(2)?)
        } else {
            (x.clone(), x.clone())
        };

        let h = self.depthwise.forward(&input)?.relu()?;
        let h = self.pointwise.forward(&h)?;

        let shortcut = if self.extra_channels > 0 {
            shortcut.pad_with_zeros(1, 0, self.extra_channels)?
        } else {
            shortcut
        };
        (h + shortcut)?.relu()
    }
}

/// Detection head for one anchor grid.
struct Head {
    classifier: Conv2d,
    regressor: Conv2d,
    anchors: usize,
}

impl Head {
    fn load(channels: usize, per_cell: usize, side: usize, vb: &VarBuilder) -> Result<Self> {
        Ok(Self {
            classifier: conv2d(
                channels,
                per_cell,
                1,
                Conv2dConfig::default(),
                vb.pp(format!("classifier_{side}")),
            )?,
            regressor: conv2d(
                channels,
                per_cell * 16,
                1,
                Conv2dConfig::default(),
                vb.pp(format!("regressor_{side}")),
            )?,
            anchors: side * side * per_cell,
        })
    }

    fn forward(&self, features: &Tensor) -> Result<(Tensor, Tensor)> {
        let scores = self
            .classifier
            .forward(features)?
            .permute((0, 2, 3, 1))?
            .reshape((1, self.anchors, 1))?;
        let boxes = self
            .regressor
            .forward(features)?
            .permute((0, 2, 3, 1))?
            .reshape((1, self.anchors, 16))?;
        Ok((scores, boxes))
    }
}

/// `BlazeFace` network with its anchor table.
pub struct BlazeFace {
    stem: Conv2d,
    backbone_16: Vec<Block>,
    backbone_8: Vec<Block>,
    head_16: Head,
    head_8: Head,
    anchors: Vec<[f32; 2]>,
    device: Device,
}

impl BlazeFace {
    /// Builds the network from loaded weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let stem = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )?;

        let backbone_16 = BACKBONE_16
            .iter()
            .enumerate()
            .map(|(i, &(in_c, out_c, s))| Block::load(in_c, out_c, s, &vb.pp(format!("backbone1.{i}"))))
            .collect::<Result<Vec<_>>>()?;
        let backbone_8 = BACKBONE_8
            .iter()
            .enumerate()
            .map(|(i, &(in_c, out_c, s))| Block::load(in_c, out_c, s, &vb.pp(format!("backbone2.{i}"))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            stem,
            backbone_16,
            backbone_8,
            head_16: Head::load(88, 2, 16, &vb)?,
            head_8: Head::load(96, 6, 8, &vb)?,
            anchors: anchor_centers(),
            device: vb.device().clone(),
        })
    }

    /// Finds faces scoring at least `min_score`, after non-maximum suppression.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn detect(&self, frame: &RgbImage, min_score: f32) -> Result<Vec<FaceBox>> {
        let input = self.to_input(frame)?;
        let (scores, boxes) = self.forward(&input)?;
        let scores = scores.squeeze(0)?.squeeze(1)?.to_vec1::<f32>()?;
        let boxes = boxes.squeeze(0)?.to_vec2::<f32>()?;
        Ok(suppress(decode(&self.anchors, &scores, &boxes, min_score)))
    }

    fn to_input(&self, frame: &RgbImage) -> Result<Tensor> {
        let side = INPUT_SIZE as u32;
        let resized = image::imageops::resize(frame, side, side, FilterType::Triangle);
        let data: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 127.5 - 1.0)
            .collect();
        Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))
            .context("Failed to build detector input")
    }

    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let mut h = self.stem.forward(&x)?.relu()?;
        for block in &self.backbone_16 {
            h = block.forward(&h)?;
        }
        let (s16, b16) = self.head_16.forward(&h)?;
        for block in &self.backbone_8 {
            h = block.forward(&h)?;
        }
        let (s8, b8) = self.head_8.forward(&h)?;

        Ok((Tensor::cat(&[s16, s8], 1)?, Tensor::cat(&[b16, b8], 1)?))
    }
}

fn anchor_centers() -> Vec<[f32; 2]> {
    let mut anchors = Vec::new();
    for (side, per_cell) in GRIDS {
        let side_f = side as f32;
        for y in 0..side {
            for x in 0..side {
                let center = [(x as f32 + 0.5) / side_f, (y as f32 + 0.5) / side_f];
                anchors.extend(std::iter::repeat(center).take(per_cell));
            }
        }
    }
    anchors
}

fn decode(anchors: &[[f32; 2]], scores: &[f32], boxes: &[Vec<f32>], min_score: f32) -> Vec<FaceBox> {
    let scale = INPUT_SIZE as f32;
    anchors
        .iter()
        .zip(scores)
        .zip(boxes)
        .filter_map(|((anchor, &logit), raw)| {
            let score = sigmoid(logit);
            if score < min_score || raw.len() < 4 {
                return None;
            }
            let cx = anchor[0] + raw[0] / scale;
            let cy = anchor[1] + raw[1] / scale;
            let half_w = raw[2] / scale / 2.0;
            let half_h = raw[3] / scale / 2.0;
            Some(FaceBox {
                bbox: [
                    (cx - half_w).clamp(0.0, 1.0),
                    (cy - half_h).clamp(0.0, 1.0),
                    (cx + half_w).clamp(0.0, 1.0),
                    (cy + half_h).clamp(0.0, 1.0),
                ],
                score,
            })
        })
        .collect()
}

/// Greedy non-maximum suppression, highest score first.
fn suppress(mut candidates: Vec<FaceBox>) -> Vec<FaceBox> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<FaceBox> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| iou(&k.bbox, &candidate.bbox) < NMS_IOU) {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let overlap_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let overlap_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = overlap_w * overlap_h;
    let union = (a[2] - a[0]) * (a[3] - a[1]) + (b[2] - b[0]) * (b[3] - b[1]) - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
