//! Pretrained model store: download, verify, locate.
//!
//! No public release hosts these weights. The safetensors files have to be
//! supplied, either copied into the models directory or served from a
//! location set as `models.base_url`.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Checksum value that disables verification for a model.
const SKIP_CHECKSUM: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Name of the face detector model.
pub const FACE_MODEL: &str = "blazeface";

/// Name of the landmark model.
pub const LANDMARK_MODEL: &str = "landmarks68";

/// A downloadable model file.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Short identifier.
    pub name: &'static str,
    /// File name inside the models directory and under the base URL.
    pub filename: &'static str,
    /// Expected SHA-256, or all zeros to skip verification.
    pub sha256: &'static str,
}

/// Every model the landmarker needs.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: FACE_MODEL,
        filename: "blazeface.safetensors",
        sha256: SKIP_CHECKSUM,
    },
    ModelInfo {
        name: LANDMARK_MODEL,
        filename: "landmarks68.safetensors",
        sha256: SKIP_CHECKSUM,
    },
];

/// Progress callback: `(model name, bytes so far, total bytes if known)`.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&str, u64, Option<u64>);

/// Default models directory: `$XDG_DATA_HOME/blinkboard/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("blinkboard")
        .join("models")
}

/// Uses `dir` when given, otherwise [`models_dir`].
#[must_use]
pub fn resolve_models_dir(dir: Option<&Path>) -> PathBuf {
    dir.map_or_else(models_dir, Path::to_path_buf)
}

/// Path of model `name` inside `dir`, if the name is known.
#[must_use]
pub fn model_path(dir: &Path, name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| dir.join(m.filename))
}

/// Each known model with whether its file exists in `dir`.
#[must_use]
pub fn list_models(dir: &Path) -> Vec<(&'static str, bool)> {
    MODELS
        .iter()
        .map(|m| (m.name, dir.join(m.filename).is_file()))
        .collect()
}

/// Paths of models missing from `dir`.
#[must_use]
pub fn missing_models(dir: &Path) -> Vec<PathBuf> {
    MODELS
        .iter()
        .map(|m| dir.join(m.filename))
        .filter(|p| !p.is_file())
        .collect()
}

/// Downloads every missing model into `dir`, reporting progress.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, a download fails,
/// or a checksum does not match.
pub fn ensure_models_with_progress(
    dir: &Path,
    base_url: &str,
    progress: ProgressCallback<'_>,
) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create models directory {}", dir.display()))?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.is_file() {
            debug!("Model {} already present", model.name);
            continue;
        }
        let url = format!("{}/{}", base_url.trim_end_matches('/'), model.filename);
        download(model, &url, &path, progress)?;
    }
    Ok(())
}

fn download(model: &ModelInfo, url: &str, path: &Path, progress: ProgressCallback<'_>) -> Result<()> {
    info!("Downloading {} from {url}", model.name);

    let mut response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to download {}", model.name))?;
    if !response.status().is_success() {
        anyhow::bail!("Download of {} failed with status {}", model.name, response.status());
    }

    let total = response.content_length();
    let mut bytes = Vec::with_capacity(usize::try_from(total.unwrap_or(0)).unwrap_or(0));
    let mut chunk = [0_u8; 64 * 1024];
    loop {
        let n = response
            .read(&mut chunk)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        progress(model.name, bytes.len() as u64, total);
    }

    verify_checksum(model, &bytes, path)?;

    // Written beside the target, then renamed over it.
    let partial = path.with_extension("part");
    fs::write(&partial, &bytes).with_context(|| format!("Failed to write {}", partial.display()))?;
    fs::rename(&partial, path).with_context(|| format!("Failed to move {} into place", model.name))?;

    info!("Downloaded {} ({} bytes)", model.name, bytes.len());
    Ok(())
}

fn verify_checksum(model: &ModelInfo, bytes: &[u8], path: &Path) -> Result<()> {
    if model.sha256 == SKIP_CHECKSUM {
        debug!("No checksum pinned for {}", model.name);
        return Ok(());
    }
    let actual = format!("{:x}", Sha256::digest(bytes));
    if actual != model.sha256 {
        anyhow::bail!(
            "Checksum mismatch for {}: expected {}, got {actual}. Delete {} and fetch again.",
            model.name,
            model.sha256,
            path.display()
        );
    }
    Ok(())
}
