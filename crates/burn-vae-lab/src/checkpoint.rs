//! Persisting trained weights through Burn's record API
//!
//! Burn's serialization works through its `Record` trait and recorders;
//! models that derive `Module` get save/load support for free. This module
//! fixes the recorder (full-precision binary files) and the on-disk naming
//! scheme, so the trainer and the explorer agree on where a model lives.
//!
//! Note the recorder appends its own file extension (`.bin`), so the paths
//! handed to it are extension-less stems.

use std::path::{Path, PathBuf};

use burn::record::{BinFileRecorder, FullPrecisionSettings, RecorderError};
use thiserror::Error;

use burn_vae_lab_data::DatasetKind;
use burn_vae_lab_models::ModelKind;

/// The recorder used for all checkpoints
pub type DefaultRecorder = BinFileRecorder<FullPrecisionSettings>;

/// Creates the workspace's default recorder
pub fn default_recorder() -> DefaultRecorder {
    BinFileRecorder::new()
}

/// Error type for checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// No checkpoint file at the expected location
    #[error("checkpoint not found: {0}")]
    NotFound(PathBuf),

    /// Error from the Burn recorder
    #[error("record error: {0}")]
    Record(#[from] RecorderError),
}

/// Extension-less checkpoint path for a trained model
///
/// The stem encodes everything needed to rebuild the architecture:
/// `{model}_{dataset}_h{latent}`.
pub fn checkpoint_path(
    dir: &Path,
    kind: ModelKind,
    dataset: DatasetKind,
    latent: usize,
) -> PathBuf {
    dir.join(format!("{}_{}_h{}", kind.name(), dataset.name(), latent))
}

/// The file the recorder actually writes for a given stem
pub fn checkpoint_file(dir: &Path, kind: ModelKind, dataset: DatasetKind, latent: usize) -> PathBuf {
    checkpoint_path(dir, kind, dataset, latent).with_extension("bin")
}
