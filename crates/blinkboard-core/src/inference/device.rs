//! Compute device selection.

use candle_core::Device;
use tracing::info;

/// Picks the device the networks run on.
///
/// With `prefer_gpu` set, tries Metal then CUDA (when compiled in) and falls
/// back to the CPU. Without it the CPU is always used.
#[must_use]
pub fn select_device(prefer_gpu: bool) -> Device {
    if prefer_gpu {
        #[cfg(feature = "metal")]
        if let Ok(device) = Device::new_metal(0) {
            info!("Running inference on Metal");
            return device;
        }

        #[cfg(feature = "cuda")]
        if let Ok(device) = Device::new_cuda(0) {
            info!("Running inference on CUDA");
            return device;
        }
    }

    info!("Running inference on CPU");
    Device::Cpu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_when_gpu_not_preferred() {
        assert!(matches!(select_device(false), Device::Cpu));
    }

    #[test]
    fn test_gpu_preference_never_panics() {
        let _device = select_device(true);
    }
}
