//! `embedded-graphics` draw target over an `image` RGB buffer.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use image::{Rgb, RgbImage};

/// Blue used for key outlines and labels.
pub const BLUE: Rgb888 = Rgb888::new(0, 0, 255);
/// Landmark and ratio overlay colour.
pub const GREEN: Rgb888 = Rgb888::new(0, 255, 0);
/// Active key fill and board background.
pub const WHITE: Rgb888 = Rgb888::WHITE;
/// Board text colour.
pub const BLACK: Rgb888 = Rgb888::BLACK;

/// Borrowed drawing surface; pixels outside the image are clipped.
pub struct Canvas<'a> {
    image: &'a mut RgbImage,
}

impl<'a> Canvas<'a> {
    /// Wraps an image for drawing.
    pub fn new(image: &'a mut RgbImage) -> Self {
        Self { image }
    }

    /// Fills the whole image with one colour.
    pub fn fill(&mut self, color: Rgb888) {
        let px = to_rgb(color);
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }
}

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x < width && y < height {
                self.image.put_pixel(x, y, to_rgb(color));
            }
        }
        Ok(())
    }
}

/// Unwraps a draw result whose error type is uninhabited.
pub fn drawn<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

fn to_rgb(color: Rgb888) -> Rgb<u8> {
    Rgb([color.r(), color.g(), color.b()])
}
