//! Key layout renderer.

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::{Point as DrawPoint, Primitive, Size};
use embedded_graphics::primitives::{
    PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_graphics::Drawable;
use image::RgbImage;

use super::canvas::{drawn, Canvas, BLUE, WHITE};
use crate::domain::KeyLayout;

/// Border thickness and inset of each key cell.
const BORDER: u32 = 2;

/// Draws every key into a fresh canvas sized for `layout`.
#[must_use]
pub fn render_keyboard(layout: &KeyLayout, active: usize) -> RgbImage {
    let (width, height) = layout.canvas_size();
    let mut image = RgbImage::new(width, height);
    render_keyboard_into(&mut image, layout, active);
    image
}

/// Clears `image` to black and draws every key, highlighting `active`.
///
/// Inactive keys get a blue outline; the active key is filled white. Labels
/// are centred and drawn in blue.
pub fn render_keyboard_into(image: &mut RgbImage, layout: &KeyLayout, active: usize) {
    let mut canvas = Canvas::new(image);
    canvas.fill(Rgb888::new(0, 0, 0));

    let label_style = MonoTextStyle::new(&FONT_10X20, BLUE);
    let centred = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();

    let mut buf = [0u8; 4];
    for (index, label) in layout.iter() {
        let cell = layout.cell(index);
        let rect = Rectangle::new(
            point(cell.x + BORDER, cell.y + BORDER),
            Size::new(
                cell.width.saturating_sub(2 * BORDER),
                cell.height.saturating_sub(2 * BORDER),
            ),
        );

        let style = if index == active {
            PrimitiveStyle::with_fill(WHITE)
        } else {
            PrimitiveStyleBuilder::new()
                .stroke_color(BLUE)
                .stroke_width(BORDER)
                .stroke_alignment(StrokeAlignment::Inside)
                .build()
        };
        drawn(rect.into_styled(style).draw(&mut canvas));

        let centre = point(cell.x + cell.width / 2, cell.y + cell.height / 2);
        let text = label.encode_utf8(&mut buf);
        drawn(Text::with_text_style(text, centre, label_style, centred).draw(&mut canvas));
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn point(x: u32, y: u32) -> DrawPoint {
    DrawPoint::new(x as i32, y as i32)
}
