//! Adapters connecting the blinkboard core to the outside world.
//!
//! - `nokhwa` webcam frame source
//! - `minifb` windows
//! - model downloads and lookup
//! - HTTP launcher page

pub mod camera;
pub mod launcher;
pub mod models;
pub mod window;

pub use camera::NokhwaCamera;
pub use launcher::{router, Launcher, ProcessLauncher};
pub use models::{list_models, model_path, models_dir, resolve_models_dir};
pub use window::WindowDisplay;
