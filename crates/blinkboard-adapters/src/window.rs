//! Native windows backed by `minifb`.

use std::collections::HashMap;

use anyhow::{Context, Result};
use blinkboard_core::ports::{Display, Surface};
use image::RgbImage;
use minifb::{Key, Window, WindowOptions};
use tracing::debug;

/// Shows each surface in its own window, created on first use.
#[derive(Default)]
pub struct WindowDisplay {
    windows: HashMap<Surface, Window>,
    buffer: Vec<u32>,
}

impl WindowDisplay {
    /// Creates a display with no windows open yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for WindowDisplay {
    fn show(&mut self, surface: Surface, image: &RgbImage) -> Result<()> {
        let (width, height) = (image.width() as usize, image.height() as usize);

        // Windows keep their creation size, so a grown surface gets a new one.
        let stale = self
            .windows
            .get(&surface)
            .is_some_and(|w| w.get_size() != (width, height));
        if stale {
            debug!("Resizing {} to {width}x{height}", surface.title());
            self.windows.remove(&surface);
        }

        let window = match self.windows.entry(surface) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let window = Window::new(surface.title(), width, height, WindowOptions::default())
                    .with_context(|| format!("Failed to open window '{}'", surface.title()))?;
                entry.insert(window)
            }
        };

        to_0rgb(image, &mut self.buffer);
        window
            .update_with_buffer(&self.buffer, width, height)
            .with_context(|| format!("Failed to draw window '{}'", surface.title()))
    }

    fn poll_exit(&mut self) -> Result<bool> {
        Ok(self
            .windows
            .values()
            .any(|w| !w.is_open() || w.is_key_down(Key::Escape)))
    }
}

/// Packs RGB pixels into minifb's `0RGB` words.
fn to_0rgb(image: &RgbImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        image
            .pixels()
            .map(|p| (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])),
    );
}
