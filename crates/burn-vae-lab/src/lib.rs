//! burn-vae-lab: Train and Explore Small Generative Image Models
//!
//! A demonstration workspace built on the Burn deep learning framework:
//! train a VAE (or a decode-only GAN generator) on MNIST, Fashion-MNIST or
//! CIFAR-10, then explore the result interactively - random generation
//! from the latent prior, reconstruction of a sampled class image, and
//! latent-space interpolation between two sampled images.
//!
//! # Modules
//!
//! - [`train`] - the mini-batch gradient-descent driver
//! - [`explorer`] - the inference pipeline behind the three exploration
//!   operations
//! - [`checkpoint`] - weight persistence over Burn's record API
//! - [`backends`] - feature-gated backend selection
//!
//! # Backend Selection
//!
//! Choose a backend via feature flags:
//! - `ndarray`: CPU backend (no GPU required, default)
//! - `wgpu`: WebGPU backend (cross-platform GPU)
//! - `tch`: PyTorch backend via libtorch (CUDA, MPS support)
//!
//! # Example
//!
//! ```ignore
//! use burn_vae_lab::backends::{default_device, Autodiff, DefaultBackend};
//! use burn_vae_lab::core::loss::ReconKind;
//! use burn_vae_lab::models::{DenseVae, DenseVaeConfig};
//! use burn_vae_lab::train::{train, TrainConfig};
//!
//! let device = default_device();
//! let model = DenseVae::<Autodiff<DefaultBackend>>::new(&config, &device);
//! let trained = train(model, &batches, &device, &TrainConfig::new(10))?;
//! ```

pub use burn_vae_lab_core as core;
pub use burn_vae_lab_data as data;
pub use burn_vae_lab_models as models;

pub mod backends;
pub mod checkpoint;
pub mod explorer;
pub mod train;

pub use explorer::{Explorer, ExplorerError, ModelSpec};
pub use train::{train, train_with, TrainConfig, TrainError, TrainReport, Trained};
