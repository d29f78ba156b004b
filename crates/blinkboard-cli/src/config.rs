//! Configuration file support for blinkboard.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/blinkboard/config.toml` (lowest priority)
//! - Project-local: `.blinkboard.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use blinkboard_core::FaceSelection;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// File name of the project-local config.
const PROJECT_FILE: &str = ".blinkboard.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Key scanning.
    pub scan: ScanConfig,
    /// Blink detection.
    pub blink: BlinkConfig,
    /// Text board.
    pub board: BoardSection,
    /// Keyboard layout.
    pub keyboard: KeyboardConfig,
    /// Camera input.
    pub camera: CameraConfig,
    /// Face detection.
    pub detection: DetectionConfig,
    /// Model store.
    pub models: ModelsConfig,
    /// HTTP launcher.
    pub server: ServerConfig,
}

/// Key scanning configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seconds each key stays highlighted.
    pub interval_secs: Option<f64>,
}

/// Blink detection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Ratio above which the eyes count as closed.
    pub threshold: Option<f32>,
    /// Consecutive closed frames that type a key.
    pub frames_to_trigger: Option<u32>,
    /// `all` or `largest`.
    pub face_selection: Option<FaceSelection>,
}

/// Text board configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BoardSection {
    /// Canvas width in pixels.
    pub width: Option<u32>,
    /// Initial canvas height in pixels.
    pub height: Option<u32>,
    /// Characters per wrapped line.
    pub max_chars_per_line: Option<usize>,
    /// Pixels between line baselines.
    pub line_height: Option<u32>,
    /// Split words longer than a line.
    pub break_long_words: Option<bool>,
}

/// Keyboard layout configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Key labels in scan order.
    pub keys: Option<String>,
    /// Keys per row.
    pub columns: Option<usize>,
}

/// Camera configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index.
    pub index: Option<u32>,
    /// Resize factor applied to each frame.
    pub scale: Option<f32>,
}

/// Face detection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum face detection confidence.
    pub min_face_confidence: Option<f32>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Download location for `models fetch`.
    pub base_url: Option<String>,
}

/// HTTP launcher configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:5000`.
    pub bind: Option<String>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.validate() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Lists every out-of-range value.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut check = |ok: bool, message: String| {
            if !ok {
                problems.push(message);
            }
        };

        if let Some(v) = self.scan.interval_secs {
            check(v.is_finite() && v > 0.0, format!("scan.interval_secs must be > 0, got {v}"));
        }
        if let Some(v) = self.blink.threshold {
            check(v.is_finite() && v > 0.0, format!("blink.threshold must be > 0, got {v}"));
        }
        if let Some(v) = self.blink.frames_to_trigger {
            check(v >= 1, format!("blink.frames_to_trigger must be >= 1, got {v}"));
        }
        if let Some(v) = self.board.width {
            check(v > 0, format!("board.width must be > 0, got {v}"));
        }
        if let Some(v) = self.board.height {
            check(v > 0, format!("board.height must be > 0, got {v}"));
        }
        if let Some(v) = self.board.max_chars_per_line {
            check(v >= 1, format!("board.max_chars_per_line must be >= 1, got {v}"));
        }
        if let Some(v) = self.board.line_height {
            check(v > 0, format!("board.line_height must be > 0, got {v}"));
        }
        if let Some(ref keys) = self.keyboard.keys {
            check(!keys.is_empty(), "keyboard.keys must not be empty".to_string());
        }
        if let Some(v) = self.keyboard.columns {
            check(v >= 1, format!("keyboard.columns must be >= 1, got {v}"));
        }
        if let Some(v) = self.camera.scale {
            check(v > 0.0 && v <= 1.0, format!("camera.scale must be in (0.0, 1.0], got {v}"));
        }
        if let Some(v) = self.detection.min_face_confidence {
            check(
                (0.0..=1.0).contains(&v),
                format!("detection.min_face_confidence must be 0.0-1.0, got {v}"),
            );
        }
        if let Some(ref bind) = self.server.bind {
            check(
                bind.parse::<SocketAddr>().is_ok(),
                format!("server.bind must be host:port, got '{bind}'"),
            );
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.scan.interval_secs = other.scan.interval_secs.or(self.scan.interval_secs);

        self.blink.threshold = other.blink.threshold.or(self.blink.threshold);
        self.blink.frames_to_trigger = other
            .blink
            .frames_to_trigger
            .or(self.blink.frames_to_trigger);
        self.blink.face_selection = other.blink.face_selection.or(self.blink.face_selection);

        self.board.width = other.board.width.or(self.board.width);
        self.board.height = other.board.height.or(self.board.height);
        self.board.max_chars_per_line = other
            .board
            .max_chars_per_line
            .or(self.board.max_chars_per_line);
        self.board.line_height = other.board.line_height.or(self.board.line_height);
        self.board.break_long_words = other
            .board
            .break_long_words
            .or(self.board.break_long_words);

        self.keyboard.keys = other.keyboard.keys.or_else(|| self.keyboard.keys.take());
        self.keyboard.columns = other.keyboard.columns.or(self.keyboard.columns);

        self.camera.index = other.camera.index.or(self.camera.index);
        self.camera.scale = other.camera.scale.or(self.camera.scale);

        self.detection.min_face_confidence = other
            .detection
            .min_face_confidence
            .or(self.detection.min_face_confidence);

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.base_url = other.models.base_url.or_else(|| self.models.base_url.take());

        self.server.bind = other.server.bind.or_else(|| self.server.bind.take());
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("blinkboard").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.blinkboard.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|path| path.is_file())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| warn!("Failed to read config file {}: {e}", path.display()))
        .ok()?;

    toml::from_str(&content)
        .map_err(|e| warn!("Failed to parse config file {}: {e}", path.display()))
        .ok()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = AppConfig::default();
        assert!(config.blink.threshold.is_none());
        assert!(config.scan.interval_secs.is_none());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[scan]
interval_secs = 2.5

[blink]
threshold = 4.0
frames_to_trigger = 3
face_selection = "largest"

[board]
width = 800
height = 400
max_chars_per_line = 30
line_height = 50
break_long_words = true

[keyboard]
keys = "ABC"
columns = 3

[camera]
index = 1
scale = 0.75

[detection]
min_face_confidence = 0.6

[models]
dir = "/opt/models"
base_url = "http://mirror.local/models"

[server]
bind = "0.0.0.0:8080"
"#;
        let config: AppConfig = toml::from_str(toml).expect("parse full config");
        assert_eq!(config.scan.interval_secs, Some(2.5));
        assert_eq!(config.blink.frames_to_trigger, Some(3));
        assert_eq!(config.blink.face_selection, Some(FaceSelection::Largest));
        assert_eq!(config.board.break_long_words, Some(true));
        assert_eq!(config.keyboard.keys.as_deref(), Some("ABC"));
        assert_eq!(config.camera.index, Some(1));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(config.server.bind.as_deref(), Some("0.0.0.0:8080"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_unknown_face_selection_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[blink]\nface_selection = \"first\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut base: AppConfig =
            toml::from_str("[blink]\nthreshold = 4.0\nframes_to_trigger = 3").unwrap();
        let project: AppConfig = toml::from_str("[blink]\nthreshold = 5.5").unwrap();

        base.merge(project);

        assert_eq!(base.blink.threshold, Some(5.5));
        assert_eq!(base.blink.frames_to_trigger, Some(3));
    }

    #[test]
    fn test_merge_keeps_strings_when_absent() {
        let mut base: AppConfig = toml::from_str("[server]\nbind = \"127.0.0.1:9000\"").unwrap();
        base.merge(AppConfig::default());
        assert_eq!(base.server.bind.as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let config: AppConfig = toml::from_str(
            r#"
[scan]
interval_secs = 0.0

[blink]
frames_to_trigger = 0

[camera]
scale = 1.5

[server]
bind = "localhost"
"#,
        )
        .unwrap();

        let problems = config.validate();
        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("scan.interval_secs"));
        assert!(problems.iter().any(|p| p.contains("camera.scale")));
        assert!(problems.iter().any(|p| p.contains("server.bind")));
    }

    #[test]
    fn test_find_config_in_parents() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(PROJECT_FILE), "").unwrap();

        let found = find_config_in_parents(&nested);
        assert_eq!(found, Some(root.path().join(PROJECT_FILE)));
    }

    #[test]
    fn test_load_file_invalid_toml_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[blink\nthreshold = ").unwrap();
        assert!(load_file(&path).is_none());
    }
}
