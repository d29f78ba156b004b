//! Rasterisation of the three display surfaces.

mod board;
mod canvas;
mod keyboard;
mod overlay;

pub use board::{BoardConfig, TextBoard};
pub use canvas::Canvas;
pub use keyboard::{render_keyboard, render_keyboard_into};
pub use overlay::draw_overlay;
