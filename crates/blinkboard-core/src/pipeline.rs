//! Capture, detect, type, render, poll: the scanning loop.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ports::{Clock, Display, FaceLandmarker, FrameSource, Surface};
use crate::render::draw_overlay;
use crate::session::{Session, StepReport};

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run another iteration.
    Continue,
    /// The user asked to quit.
    Exit,
}

/// Adapters the loop runs against.
pub struct Ports<'a> {
    /// Camera.
    pub source: &'a mut dyn FrameSource,
    /// Landmark model.
    pub landmarker: &'a dyn FaceLandmarker,
    /// Windows.
    pub display: &'a mut dyn Display,
    /// Time source for the scan timer.
    pub clock: &'a dyn Clock,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Text typed during the run.
    pub text: String,
    /// Frames processed.
    pub frames: u64,
    /// Keys typed.
    pub commits: u64,
    /// When the loop ended (RFC 3339, UTC).
    pub finished_at: String,
}

/// Runs one loop iteration.
///
/// # Errors
///
/// Returns an error if frame capture, detection or display fails.
pub fn step(session: &mut Session, ports: &mut Ports<'_>) -> Result<Flow> {
    let raw = ports
        .source
        .next_frame()
        .context("Failed to read camera frame")?;
    let mut frame = scale_frame(&raw, session.config().frame_scale);

    let faces = ports
        .landmarker
        .detect(&frame)
        .context("Landmark detection failed")?;
    debug!("Found {} faces", faces.len());

    let report: StepReport = session.update(&faces, ports.clock.now());

    draw_overlay(&mut frame, &faces, report.ratio, report.blinking);
    ports.display.show(Surface::Camera, &frame)?;
    ports
        .display
        .show(Surface::Keyboard, session.render_keyboard())?;
    ports.display.show(Surface::Board, session.render_board())?;

    if ports.display.poll_exit()? {
        info!("Exit requested");
        return Ok(Flow::Exit);
    }
    Ok(Flow::Continue)
}

/// Repeats [`step`] until the user quits or an error occurs.
///
/// The frame source is released on every exit path before returning.
///
/// # Errors
///
/// Returns the first error raised by an iteration.
pub fn run(session: &mut Session, ports: &mut Ports<'_>) -> Result<RunSummary> {
    info!(
        "Scanning {} keys every {:.1}s",
        session.layout().len(),
        session.config().scan_interval.as_secs_f32()
    );

    let outcome = loop {
        match step(session, ports) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    if let Err(e) = ports.source.release() {
        warn!("Failed to release camera: {e:#}");
    }

    outcome.map(|()| RunSummary {
        text: session.text().to_string(),
        frames: session.frames(),
        commits: session.commits(),
        finished_at: iso_timestamp(),
    })
}

/// Resizes `frame` by `scale`; a scale of 1.0 (or invalid) copies it unchanged.
#[must_use]
pub fn scale_frame(frame: &RgbImage, scale: f32) -> RgbImage {
    if !(scale.is_finite() && scale > 0.0) || (scale - 1.0).abs() < f32::EPSILON {
        return frame.clone();
    }
    let width = ((frame.width() as f32 * scale).round() as u32).max(1);
    let height = ((frame.height() as f32 * scale).round() as u32).max(1);
    image::imageops::resize(frame, width, height, FilterType::Triangle)
}

/// ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
