//! Synthetic landmark and frame builders.

use blinkboard_core::domain::{BoundingBox, FaceLandmarks, Point, LANDMARK_COUNT, LEFT_EYE, RIGHT_EYE};
use image::{Rgb, RgbImage};

/// Eye width in pixels for built faces.
const EYE_WIDTH: f32 = 30.0;

/// Builds a face whose eyes produce a chosen blink ratio.
#[derive(Debug, Clone)]
pub struct LandmarkBuilder {
    bbox: BoundingBox,
    left_ratio: Option<f32>,
    right_ratio: Option<f32>,
}

impl Default for LandmarkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkBuilder {
    /// A 200x200 face at (100, 100) with open eyes (ratio 3.0).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bbox: BoundingBox::new(100, 100, 200, 200),
            left_ratio: Some(3.0),
            right_ratio: Some(3.0),
        }
    }

    /// Sets the ratio of both eyes.
    #[must_use]
    pub fn ratio(mut self, ratio: f32) -> Self {
        self.left_ratio = Some(ratio);
        self.right_ratio = Some(ratio);
        self
    }

    /// Sets each eye's ratio separately.
    #[must_use]
    pub fn eye_ratios(mut self, left: f32, right: f32) -> Self {
        self.left_ratio = Some(left);
        self.right_ratio = Some(right);
        self
    }

    /// Collapses both lids so no ratio can be measured.
    #[must_use]
    pub fn flat_eyes(mut self) -> Self {
        self.left_ratio = None;
        self.right_ratio = None;
        self
    }

    /// Moves and resizes the face box.
    #[must_use]
    pub const fn bbox(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        self.bbox = BoundingBox::new(x, y, width, height);
        self
    }

    /// Builds the landmark set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    #[allow(clippy::expect_used)]
    pub fn build(self) -> FaceLandmarks {
        let (x, y) = (self.bbox.x as f32, self.bbox.y as f32);
        let (w, h) = (self.bbox.width as f32, self.bbox.height as f32);

        // Non-eye points spread along the box so they stay inside it.
        let mut points: Vec<Point> = (0..LANDMARK_COUNT)
            .map(|i| {
                let t = i as f32 / LANDMARK_COUNT as f32;
                Point::new(x + w * t, y + h * 0.75)
            })
            .collect();

        let eye_y = y + h * 0.4;
        place_eye(&mut points, LEFT_EYE, Point::new(x + w * 0.3, eye_y), self.left_ratio);
        place_eye(&mut points, RIGHT_EYE, Point::new(x + w * 0.7, eye_y), self.right_ratio);

        FaceLandmarks::new(self.bbox, 0.95, points).expect("builder emits 68 points")
    }
}

/// Writes a six-point eye contour centred on `center`.
///
/// With `ratio` the lid gap is `EYE_WIDTH / ratio`; without it the lids meet.
fn place_eye(points: &mut [Point], indices: [usize; 6], center: Point, ratio: Option<f32>) {
    let half_w = EYE_WIDTH / 2.0;
    let half_gap = ratio.map_or(0.0, |r| EYE_WIDTH / r / 2.0);
    let contour = [
        Point::new(center.x - half_w, center.y),
        Point::new(center.x - 5.0, center.y - half_gap),
        Point::new(center.x + 5.0, center.y - half_gap),
        Point::new(center.x + half_w, center.y),
        Point::new(center.x + 5.0, center.y + half_gap),
        Point::new(center.x - 5.0, center.y + half_gap),
    ];
    for (index, point) in indices.into_iter().zip(contour) {
        points[index] = point;
    }
}

/// Synthetic camera frames.
pub struct SyntheticFrame;

impl SyntheticFrame {
    /// A uniform gray frame.
    #[must_use]
    pub fn gray(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([128, 128, 128]))
    }
}
