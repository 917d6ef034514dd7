//! Backend support for burn-vae-lab
//!
//! This module provides convenient access to different Burn backends.
//! Enable the desired backend via feature flags:
//!
//! - `ndarray`: CPU backend using ndarray (no GPU required, default)
//! - `wgpu`: WebGPU backend (cross-platform GPU support)
//! - `tch`: PyTorch backend via libtorch (supports CUDA, MPS)
//!
//! Training wraps any of them in [`Autodiff`]; inference uses the inner
//! backend directly.

pub use burn::backend::Autodiff;

#[cfg(feature = "ndarray")]
pub use burn_ndarray::{NdArray, NdArrayDevice};

#[cfg(feature = "tch")]
pub use burn_tch::{LibTorch, LibTorchDevice};

#[cfg(feature = "wgpu")]
pub use burn_wgpu::{Wgpu, WgpuDevice};

/// Type alias for the default backend when using ndarray feature
#[cfg(feature = "ndarray")]
pub type DefaultBackend = NdArray;

/// Type alias for the default backend when using tch feature
#[cfg(all(feature = "tch", not(feature = "ndarray")))]
pub type DefaultBackend = LibTorch;

/// Type alias for the default backend when using wgpu feature
#[cfg(all(feature = "wgpu", not(any(feature = "ndarray", feature = "tch"))))]
pub type DefaultBackend = Wgpu;

/// Get the default device for the enabled backend
#[cfg(feature = "ndarray")]
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Get the default device for the enabled backend
#[cfg(all(feature = "tch", not(feature = "ndarray")))]
pub fn default_device() -> LibTorchDevice {
    // Try to use CUDA if available, otherwise CPU
    if burn_tch::is_cuda_available() {
        LibTorchDevice::Cuda(0)
    } else {
        LibTorchDevice::Cpu
    }
}

/// Get the default device for the enabled backend
#[cfg(all(feature = "wgpu", not(any(feature = "ndarray", feature = "tch"))))]
pub fn default_device() -> WgpuDevice {
    WgpuDevice::default()
}
