//! Text board: wrapped output text on a canvas that only grows.

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::prelude::Point as DrawPoint;
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;
use image::RgbImage;
use tracing::debug;

use super::canvas::{drawn, Canvas, BLACK, WHITE};
use crate::domain::wrap;

/// Left margin of each text line.
const MARGIN_X: i32 = 10;

/// Text board layout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Initial canvas height in pixels.
    pub height: u32,
    /// Maximum characters per wrapped line.
    pub max_chars_per_line: usize,
    /// Vertical distance between line baselines.
    pub line_height: u32,
    /// Split words longer than a line instead of overflowing.
    pub break_long_words: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            max_chars_per_line: 40,
            line_height: 60,
            break_long_words: false,
        }
    }
}

/// Canvas showing the typed text.
#[derive(Debug, Clone)]
pub struct TextBoard {
    config: BoardConfig,
    canvas: RgbImage,
}

impl TextBoard {
    /// Creates a blank board.
    #[must_use]
    pub fn new(config: BoardConfig) -> Self {
        let canvas = blank(config.width, config.height);
        Self { config, canvas }
    }

    /// Current canvas height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Last rendered canvas.
    #[must_use]
    pub const fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    /// Wraps `text` and redraws the board.
    ///
    /// If the wrapped lines need more height than the canvas has, the canvas
    /// is replaced by a taller one first. It never shrinks.
    pub fn render(&mut self, text: &str) -> &RgbImage {
        let lines = wrap(
            text,
            self.config.max_chars_per_line,
            self.config.break_long_words,
        );

        let needed = u32::try_from(lines.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(self.config.line_height);
        if needed > self.canvas.height() {
            debug!(
                "Growing text board from {} to {} px",
                self.canvas.height(),
                needed
            );
            self.canvas = blank(self.config.width, needed);
        }

        let mut canvas = Canvas::new(&mut self.canvas);
        canvas.fill(WHITE);

        let style = MonoTextStyle::new(&FONT_10X20, BLACK);
        let line_height = i32::try_from(self.config.line_height).unwrap_or(i32::MAX);
        let mut baseline = 0i32;
        for line in &lines {
            baseline = baseline.saturating_add(line_height);
            let origin = DrawPoint::new(MARGIN_X, baseline);
            drawn(Text::with_baseline(line, origin, style, Baseline::Alphabetic).draw(&mut canvas));
        }

        &self.canvas
    }
}

impl Default for TextBoard {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width.max(1), height.max(1), image::Rgb([255, 255, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(height: u32) -> BoardConfig {
        BoardConfig {
            height,
            ..BoardConfig::default()
        }
    }

    /// Six words of 39 characters each: one word per 40-char line.
    fn six_lines() -> String {
        vec!["X".repeat(39); 6].join(" ")
    }

    #[test]
    fn test_initial_board_is_white() {
        let board = TextBoard::default();
        assert_eq!(board.canvas().dimensions(), (1000, 500));
        assert!(board.canvas().pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_grows_for_six_lines() {
        let mut board = TextBoard::new(config(300));
        board.render(&six_lines());
        assert!(board.height() >= 360);
        assert_eq!(board.height(), 360);
    }

    #[test]
    fn test_does_not_grow_when_text_fits() {
        let mut board = TextBoard::default();
        board.render(&six_lines());
        assert_eq!(board.height(), 500);
    }

    #[test]
    fn test_never_shrinks() {
        let mut board = TextBoard::new(config(100));
        board.render(&six_lines());
        assert_eq!(board.height(), 360);
        board.render("A");
        assert_eq!(board.height(), 360);
    }

    #[test]
    fn test_text_is_drawn_on_first_line() {
        let mut board = TextBoard::default();
        let canvas = board.render("HELLO");

        let dark_pixels = (0..200)
            .flat_map(|x| (35..60).map(move |y| (x, y)))
            .filter(|&(x, y)| canvas.get_pixel(x, y).0 == [0, 0, 0])
            .count();
        assert!(dark_pixels > 0);
    }

    #[test]
    fn test_redraw_clears_previous_text() {
        let mut board = TextBoard::default();
        board.render("HELLO WORLD");
        let canvas = board.render("");
        assert!(canvas.pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
