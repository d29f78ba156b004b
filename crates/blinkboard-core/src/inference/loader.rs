//! Safetensors weight loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use tracing::debug;

/// Reads a safetensors file onto `device` and wraps it in a `VarBuilder`.
///
/// # Errors
///
/// Returns an error if the file is missing, is not valid safetensors, or
/// holds a tensor with an unsupported element type.
pub fn load_weights(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read weights: {}", path.display()))?;
    let file = SafeTensors::deserialize(&bytes)
        .with_context(|| format!("Not a safetensors file: {}", path.display()))?;

    let mut tensors = HashMap::new();
    for (name, view) in file.tensors() {
        let dtype = to_candle_dtype(view.dtype())
            .with_context(|| format!("Tensor '{name}' in {}", path.display()))?;
        let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
            .with_context(|| format!("Failed to build tensor '{name}'"))?;
        tensors.insert(name, tensor);
    }
    debug!("Loaded {} tensors from {}", tensors.len(), path.display());

    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

fn to_candle_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    Ok(match dtype {
        S::F32 => DType::F32,
        S::F64 => DType::F64,
        S::F16 => DType::F16,
        S::BF16 => DType::BF16,
        S::I64 => DType::I64,
        S::U32 => DType::U32,
        S::U8 => DType::U8,
        other => anyhow::bail!("Unsupported dtype: {other:?}"),
    })
}
