//! Webcam frame source backed by `nokhwa`.

use anyhow::{Context, Result};
use blinkboard_core::ports::FrameSource;
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{debug, info, warn};

/// A system camera streaming RGB frames.
pub struct NokhwaCamera {
    camera: Camera,
    streaming: bool,
}

impl NokhwaCamera {
    /// Opens camera `index` and starts streaming.
    ///
    /// # Errors
    ///
    /// Returns an error if the device does not exist or refuses to stream.
    pub fn open(index: u32) -> Result<Self> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), format)
            .with_context(|| format!("Failed to open camera {index}"))?;
        camera
            .open_stream()
            .with_context(|| format!("Failed to start streaming from camera {index}"))?;

        let resolution = camera.resolution();
        info!(
            "Camera {index} streaming at {}x{}",
            resolution.width(),
            resolution.height()
        );
        Ok(Self {
            camera,
            streaming: true,
        })
    }

    fn stop(&mut self) -> Result<()> {
        if self.streaming {
            self.streaming = false;
            self.camera
                .stop_stream()
                .context("Failed to stop camera stream")?;
            debug!("Camera stream stopped");
        }
        Ok(())
    }
}

impl FrameSource for NokhwaCamera {
    fn next_frame(&mut self) -> Result<RgbImage> {
        anyhow::ensure!(self.streaming, "Camera has been released");
        let buffer = self.camera.frame().context("Failed to capture frame")?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .context("Camera frame has an unexpected buffer size")
    }

    fn release(&mut self) -> Result<()> {
        self.stop()
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{e:#}");
        }
    }
}
