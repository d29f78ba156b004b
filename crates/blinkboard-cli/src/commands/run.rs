//! Run command - open the camera and type by blinking.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use blinkboard_adapters::models::{missing_models, model_path, FACE_MODEL, LANDMARK_MODEL};
use blinkboard_adapters::{resolve_models_dir, NokhwaCamera, WindowDisplay};
use blinkboard_core::domain::{
    KeyLayout, DEFAULT_BLINK_THRESHOLD, DEFAULT_COLUMNS, DEFAULT_FRAMES_TO_TRIGGER, DEFAULT_KEYS,
    DEFAULT_SCAN_INTERVAL,
};
use blinkboard_core::ports::{Clock, SystemClock};
use blinkboard_core::render::BoardConfig;
use blinkboard_core::{
    pipeline, CandleLandmarker, DetectorConfig, FaceSelection, Ports, RunSummary, Session,
    SessionConfig, DEFAULT_MIN_FACE_CONFIDENCE,
};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use crate::config::AppConfig;

/// Hardcoded default values.
mod defaults {
    pub const CAMERA_INDEX: u32 = 0;
    pub const FRAME_SCALE: f32 = 0.5;
}

/// Which faces feed the blink detector.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FaceSelectionArg {
    /// Every detected face
    All,
    /// Only the largest face
    Largest,
}

impl From<FaceSelectionArg> for FaceSelection {
    fn from(arg: FaceSelectionArg) -> Self {
        match arg {
            FaceSelectionArg::All => Self::All,
            FaceSelectionArg::Largest => Self::Largest,
        }
    }
}

fn parse_positive_f32(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be greater than 0"))
    }
}

fn parse_interval(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be greater than 0"))
    }
}

fn parse_scale(s: &str) -> Result<f32, String> {
    let value = parse_positive_f32(s)?;
    if value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not in (0.0, 1.0]"))
    }
}

/// Arguments for the scanning keyboard.
#[derive(Args, Clone, Default)]
pub struct RunArgs {
    /// Camera device index
    #[arg(long, value_name = "INDEX")]
    pub camera: Option<u32>,

    /// Resize factor applied to each frame before detection (0.0-1.0]
    #[arg(long, value_parser = parse_scale)]
    pub scale: Option<f32>,

    /// Seconds each key stays highlighted
    #[arg(long, value_name = "SECS", value_parser = parse_interval)]
    pub interval: Option<f64>,

    /// Blink ratio above which the eyes count as closed
    #[arg(long, value_parser = parse_positive_f32)]
    pub threshold: Option<f32>,

    /// Consecutive closed-eye frames that type a key
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub frames: Option<u32>,

    /// Characters per line on the text board
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_chars: Option<u64>,

    /// Which faces feed the blink detector
    #[arg(long, value_enum)]
    pub face_selection: Option<FaceSelectionArg>,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: AppConfig,
}

impl RunArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.camera = args.camera.or(config.camera.index);
        args.scale = args.scale.or(config.camera.scale);
        args.interval = args.interval.or(config.scan.interval_secs);
        args.threshold = args.threshold.or(config.blink.threshold);
        args.frames = args.frames.or(config.blink.frames_to_trigger);
        args.max_chars = args
            .max_chars
            .or_else(|| config.board.max_chars_per_line.and_then(|n| u64::try_from(n).ok()));
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        args.config = config.clone();
        args
    }

    fn camera_index(&self) -> u32 {
        self.camera.unwrap_or(defaults::CAMERA_INDEX)
    }

    fn scan_interval(&self) -> Duration {
        match self.interval.map(Duration::try_from_secs_f64) {
            Some(Ok(interval)) if !interval.is_zero() => interval,
            Some(_) => {
                warn!("Invalid scan interval, using {:?}", DEFAULT_SCAN_INTERVAL);
                DEFAULT_SCAN_INTERVAL
            }
            None => DEFAULT_SCAN_INTERVAL,
        }
    }

    fn face_selection(&self) -> FaceSelection {
        self.face_selection
            .map(FaceSelection::from)
            .or(self.config.blink.face_selection)
            .unwrap_or_default()
    }

    fn board(&self) -> BoardConfig {
        let defaults = BoardConfig::default();
        let section = &self.config.board;
        BoardConfig {
            width: section.width.unwrap_or(defaults.width),
            height: section.height.unwrap_or(defaults.height),
            max_chars_per_line: self
                .max_chars
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.max_chars_per_line),
            line_height: section.line_height.unwrap_or(defaults.line_height),
            break_long_words: section.break_long_words.unwrap_or(defaults.break_long_words),
        }
    }

    /// Session settings after layering.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            scan_interval: self.scan_interval(),
            blink_threshold: self.threshold.unwrap_or(DEFAULT_BLINK_THRESHOLD),
            frames_to_trigger: self.frames.unwrap_or(DEFAULT_FRAMES_TO_TRIGGER),
            face_selection: self.face_selection(),
            frame_scale: self.scale.unwrap_or(defaults::FRAME_SCALE),
            board: self.board(),
        }
    }

    /// Key layout after layering.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured layout has no keys or no columns.
    pub fn layout(&self) -> Result<KeyLayout> {
        let keys = self.config.keyboard.keys.as_deref().unwrap_or(DEFAULT_KEYS);
        let columns = self.config.keyboard.columns.unwrap_or(DEFAULT_COLUMNS);
        KeyLayout::new(keys.chars(), columns).context("Invalid keyboard layout")
    }

    fn detector_config(&self) -> Result<DetectorConfig> {
        let dir = resolve_models_dir(self.models_dir.as_deref());
        let missing = missing_models(&dir);
        if !missing.is_empty() {
            let list: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            anyhow::bail!(
                "Missing model files: {}. Copy them there, or set `models.base_url` and run \
                 `blinkboard models fetch` to download them.",
                list.join(", ")
            );
        }

        Ok(DetectorConfig {
            min_face_confidence: self
                .config
                .detection
                .min_face_confidence
                .unwrap_or(DEFAULT_MIN_FACE_CONFIDENCE),
            face_model: model_path(&dir, FACE_MODEL).context("Unknown face model")?,
            landmark_model: model_path(&dir, LANDMARK_MODEL).context("Unknown landmark model")?,
            prefer_gpu: true,
        })
    }
}

/// Run the scanning keyboard until ESC, then print a JSON summary.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &RunArgs) -> Result<()> {
    let layout = args.layout()?;
    let session_config = args.session_config();

    // Models are checked before the camera is touched.
    let landmarker = CandleLandmarker::load(&args.detector_config()?)?;
    let mut camera = NokhwaCamera::open(args.camera_index())?;
    let mut display = WindowDisplay::new();
    let clock = SystemClock;

    let mut session = Session::new(session_config, layout, clock.now());
    info!("Press ESC in any window to quit");

    let summary = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut camera,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )?;

    print_summary(&summary)
}

fn print_summary(summary: &RunSummary) -> Result<()> {
    let line = serde_json::to_string(summary).context("Failed to serialize run summary")?;
    println!("{line}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(toml: &str) -> AppConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let args = RunArgs::with_config(RunArgs::default(), &AppConfig::default());
        let session = args.session_config();

        assert_eq!(session.scan_interval, Duration::from_secs(3));
        assert!((session.blink_threshold - 4.25).abs() < f32::EPSILON);
        assert_eq!(session.frames_to_trigger, 5);
        assert_eq!(session.face_selection, FaceSelection::All);
        assert!((session.frame_scale - 0.5).abs() < f32::EPSILON);
        assert_eq!(session.board, BoardConfig::default());
        assert_eq!(args.camera_index(), 0);
        assert_eq!(args.layout().unwrap().len(), DEFAULT_KEYS.chars().count());
    }

    #[test]
    fn test_config_fills_unset_flags() {
        let cfg = config(
            r#"
[scan]
interval_secs = 1.5

[blink]
threshold = 3.5
face_selection = "largest"

[board]
max_chars_per_line = 20
"#,
        );
        let args = RunArgs::with_config(RunArgs::default(), &cfg);
        let session = args.session_config();

        assert_eq!(session.scan_interval, Duration::from_millis(1500));
        assert!((session.blink_threshold - 3.5).abs() < f32::EPSILON);
        assert_eq!(session.face_selection, FaceSelection::Largest);
        assert_eq!(session.board.max_chars_per_line, 20);
    }

    #[test]
    fn test_cli_beats_config() {
        let cfg = config("[blink]\nthreshold = 3.5\nface_selection = \"largest\"\n[camera]\nindex = 2");
        let cli = RunArgs {
            threshold: Some(6.0),
            camera: Some(1),
            face_selection: Some(FaceSelectionArg::All),
            ..RunArgs::default()
        };
        let args = RunArgs::with_config(cli, &cfg);

        assert!((args.session_config().blink_threshold - 6.0).abs() < f32::EPSILON);
        assert_eq!(args.session_config().face_selection, FaceSelection::All);
        assert_eq!(args.camera_index(), 1);
    }

    #[test]
    fn test_custom_layout_from_config() {
        let cfg = config("[keyboard]\nkeys = \"AB CD\"\ncolumns = 2");
        let layout = RunArgs::with_config(RunArgs::default(), &cfg).layout().unwrap();
        assert_eq!(layout.len(), 5);
        assert_eq!(layout.rows(), 3);
    }

    #[test]
    fn test_empty_layout_is_error() {
        let cfg = config("[keyboard]\nkeys = \"\"");
        assert!(RunArgs::with_config(RunArgs::default(), &cfg).layout().is_err());
    }

    #[test]
    fn test_missing_models_named_in_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            models_dir: Some(dir.path().to_path_buf()),
            ..RunArgs::default()
        };
        let message = args.detector_config().err().map(|e| e.to_string()).unwrap();
        assert!(message.contains("blazeface.safetensors"));
        assert!(message.contains("blinkboard models fetch"));
    }

    #[test]
    fn test_parse_scale_bounds() {
        assert!(parse_scale("0.5").is_ok());
        assert!(parse_scale("1.0").is_ok());
        assert!(parse_scale("0").is_err());
        assert!(parse_scale("1.5").is_err());
        assert!(parse_scale("abc").is_err());
    }
}
