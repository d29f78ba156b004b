//! Frame source port for camera input.

use image::RgbImage;

/// Port for acquiring video frames.
pub trait FrameSource {
    /// Blocks until the next frame is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the device fails to deliver a frame.
    fn next_frame(&mut self) -> anyhow::Result<RgbImage>;

    /// Releases the underlying device.
    ///
    /// Called once when the loop ends, whether it ended cleanly or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the device could not be closed cleanly.
    fn release(&mut self) -> anyhow::Result<()>;
}
