//! Landmark and blink-ratio overlay on the camera frame.

#![allow(clippy::cast_possible_truncation)]

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::prelude::{Point as DrawPoint, Primitive};
use embedded_graphics::primitives::{Circle, PrimitiveStyle};
use embedded_graphics::text::Text;
use embedded_graphics::Drawable;
use image::RgbImage;

use super::canvas::{drawn, Canvas, BLUE, GREEN};
use crate::domain::FaceLandmarks;

/// Landmark dot diameter (radius 2).
const DOT_DIAMETER: u32 = 5;

/// Marks every landmark and prints the last blink ratio.
///
/// `BLINKING` is shown while `blinking` is set.
pub fn draw_overlay(
    frame: &mut RgbImage,
    faces: &[FaceLandmarks],
    ratio: Option<f32>,
    blinking: bool,
) {
    let mut canvas = Canvas::new(frame);
    let dot = PrimitiveStyle::with_fill(GREEN);

    for face in faces {
        for p in face.points() {
            let centre = DrawPoint::new(p.x.round() as i32, p.y.round() as i32);
            drawn(
                Circle::with_center(centre, DOT_DIAMETER)
                    .into_styled(dot)
                    .draw(&mut canvas),
            );
        }
    }

    if let Some(ratio) = ratio {
        let label = format!("Blinking Ratio: {ratio:.2}");
        let style = MonoTextStyle::new(&FONT_10X20, GREEN);
        drawn(Text::new(&label, DrawPoint::new(10, 40), style).draw(&mut canvas));
    }

    if blinking {
        let style = MonoTextStyle::new(&FONT_10X20, BLUE);
        drawn(Text::new("BLINKING", DrawPoint::new(50, 150), style).draw(&mut canvas));
    }
}
