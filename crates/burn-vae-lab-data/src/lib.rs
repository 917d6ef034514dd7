//! Dataset Loaders and Batch Sources
//!
//! The data-source boundary of the workspace: a [`BatchSource`] yields
//! image batches on demand and reports its fixed image dimensionality;
//! batching policy (batch size, shuffling) lives here, not in the training
//! driver.
//!
//! # Datasets
//!
//! - [`DatasetKind::Mnist`] / [`DatasetKind::FashionMnist`] - IDX ubyte
//!   files (`train-images-idx3-ubyte` + `train-labels-idx1-ubyte`)
//! - [`DatasetKind::Cifar10`] - binary batches (`data_batch_1..5.bin`)
//!
//! Pixels are converted to `f32` in `[0, 1]` at load time.

pub mod cifar;
pub mod dataset;
pub mod idx;

pub use dataset::{InMemoryDataset, MiniBatches, SyntheticBatches};

use std::fmt;
use std::str::FromStr;

use burn::prelude::*;
use thiserror::Error;

use burn_vae_lab_core::ImageDims;

/// Error type for dataset loading and batching
#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: unexpected magic {found:#010x} (expected {expected:#010x})")]
    BadMagic {
        path: String,
        expected: u32,
        found: u32,
    },

    #[error("{path}: truncated file: expected {expected} bytes, got {actual}")]
    Truncated {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("{path}: header shape {found:?} does not match expected {expected:?}")]
    BadShape {
        path: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("image and label counts disagree: {images} images, {labels} labels")]
    CountMismatch { images: usize, labels: usize },

    #[error("label {label} out of range for {classes} classes")]
    LabelOutOfRange { label: u8, classes: usize },

    #[error("batch index {index} out of range ({batches} batches)")]
    BatchOutOfRange { index: usize, batches: usize },
}

/// One mini-batch of images with optional labels
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Image batch `[n, c, h, w]`, values in `[0, 1]`
    pub images: Tensor<B, 4>,
    /// Class labels, when the source has them
    pub labels: Option<Vec<u8>>,
}

/// A provider of image batches with a fixed image dimensionality
pub trait BatchSource<B: Backend> {
    /// Shape of a single image
    fn dims(&self) -> ImageDims;

    /// Number of batches one pass over the source yields
    fn num_batches(&self) -> usize;

    /// Materializes the batch at `index` on `device`
    fn load_batch(&self, index: usize, device: &B::Device) -> Result<ImageBatch<B>, DataError>;
}

/// Dataset selector with the fixed shapes and class tables of the three
/// toy datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DatasetKind {
    #[default]
    Mnist,
    FashionMnist,
    Cifar10,
}

impl DatasetKind {
    /// All datasets, in display order
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Mnist,
        DatasetKind::FashionMnist,
        DatasetKind::Cifar10,
    ];

    /// Short name for display, directories and checkpoint naming
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Mnist => "mnist",
            DatasetKind::FashionMnist => "fmnist",
            DatasetKind::Cifar10 => "cifar10",
        }
    }

    /// Shape of a single image
    pub fn dims(&self) -> ImageDims {
        match self {
            DatasetKind::Mnist | DatasetKind::FashionMnist => ImageDims::new(1, 28, 28),
            DatasetKind::Cifar10 => ImageDims::new(3, 32, 32),
        }
    }

    /// Human-readable class names, indexed by label
    pub fn class_names(&self) -> &'static [&'static str; 10] {
        match self {
            DatasetKind::Mnist => &["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"],
            DatasetKind::FashionMnist => &[
                "T-shirt/top",
                "Trouser",
                "Pullover",
                "Dress",
                "Coat",
                "Sandal",
                "Shirt",
                "Sneaker",
                "Bag",
                "Ankle boot",
            ],
            DatasetKind::Cifar10 => &[
                "airplane",
                "automobile",
                "bird",
                "cat",
                "deer",
                "dog",
                "frog",
                "horse",
                "ship",
                "truck",
            ],
        }
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names().len()
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown dataset: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_dims() {
        assert_eq!(DatasetKind::Mnist.dims(), ImageDims::new(1, 28, 28));
        assert_eq!(DatasetKind::FashionMnist.dims(), ImageDims::new(1, 28, 28));
        assert_eq!(DatasetKind::Cifar10.dims(), ImageDims::new(3, 32, 32));
    }

    #[test]
    fn test_dataset_round_trips_through_name() {
        for kind in DatasetKind::ALL {
            assert_eq!(kind.name().parse::<DatasetKind>().unwrap(), kind);
        }
        assert!("imagenet".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn test_class_tables_have_ten_entries() {
        for kind in DatasetKind::ALL {
            assert_eq!(kind.num_classes(), 10);
        }
        assert_eq!(DatasetKind::FashionMnist.class_names()[9], "Ankle boot");
    }
}
