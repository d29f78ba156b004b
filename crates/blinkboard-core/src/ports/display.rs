//! Display port for the live windows.

use image::RgbImage;

/// One of the three live surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Camera feed with landmark overlay.
    Camera,
    /// Scanning keyboard.
    Keyboard,
    /// Typed text.
    Board,
}

impl Surface {
    /// Window title for this surface.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Camera => "Webcam Frame",
            Self::Keyboard => "Virtual Keyboard",
            Self::Board => "Text Board",
        }
    }
}

/// Port for presenting surfaces and reading the exit key.
pub trait Display {
    /// Replaces the contents of `surface` with `image`.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be updated.
    fn show(&mut self, surface: Surface, image: &RgbImage) -> anyhow::Result<()>;

    /// Processes pending input and reports whether the user asked to quit.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be polled.
    fn poll_exit(&mut self) -> anyhow::Result<bool>;
}
