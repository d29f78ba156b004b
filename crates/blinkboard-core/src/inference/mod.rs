//! Candle inference for face boxes and 68-point landmarks.
//!
//! Two networks run back to back on every frame:
//! - `BlazeFace` finds face boxes on a 128x128 view of the frame
//! - a small convolutional regressor places 68 points inside each box

mod blazeface;
mod device;
mod landmarks;
mod loader;
mod utils;

pub use blazeface::{BlazeFace, FaceBox};
pub use device::select_device;
pub use landmarks::{LandmarkRegressor, CROP_MARGIN, CROP_SIZE};
pub use loader::load_weights;
pub use utils::sigmoid;
