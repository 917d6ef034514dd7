//! In-memory datasets and mini-batch planning

use std::path::Path;

use burn::prelude::*;
use burn::tensor::{Distribution, TensorData};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use burn_vae_lab_core::ImageDims;

use crate::{cifar, idx, BatchSource, DataError, DatasetKind, ImageBatch};

/// A labeled image dataset held in memory
///
/// Pixels are stored contiguously (`n * c * h * w` floats in `[0, 1]`),
/// one byte label per image.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    dims: ImageDims,
    pixels: Vec<f32>,
    labels: Vec<u8>,
}

impl InMemoryDataset {
    /// Wraps raw pixel and label buffers
    pub fn new(dims: ImageDims, pixels: Vec<f32>, labels: Vec<u8>) -> Result<Self, DataError> {
        let expected = labels.len() * dims.len();
        if pixels.len() != expected {
            return Err(DataError::CountMismatch {
                images: pixels.len() / dims.len().max(1),
                labels: labels.len(),
            });
        }
        Ok(Self {
            dims,
            pixels,
            labels,
        })
    }

    /// Loads the training split of `kind` from `dir`
    ///
    /// `dir` is the dataset's own directory (e.g. `data/mnist`), holding
    /// the un-gzipped IDX or CIFAR binary files.
    pub fn from_dir(kind: DatasetKind, dir: &Path) -> Result<Self, DataError> {
        let dims = kind.dims();
        let (pixels, labels) = match kind {
            DatasetKind::Mnist | DatasetKind::FashionMnist => idx::load_pair(
                &dir.join("train-images-idx3-ubyte"),
                &dir.join("train-labels-idx1-ubyte"),
                dims,
            )?,
            DatasetKind::Cifar10 => cifar::load_train(dir)?,
        };
        Self::new(dims, pixels, labels)
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the dataset holds no images
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Shape of a single image
    pub fn dims(&self) -> ImageDims {
        self.dims
    }

    /// Label of the image at `index`
    pub fn label(&self, index: usize) -> u8 {
        self.labels[index]
    }

    /// Materializes the image at `index` as a `[c, h, w]` tensor
    pub fn image<B: Backend>(&self, index: usize, device: &B::Device) -> Tensor<B, 3> {
        let len = self.dims.len();
        let start = index * len;
        let data = TensorData::new(
            self.pixels[start..start + len].to_vec(),
            [self.dims.channels, self.dims.height, self.dims.width],
        );
        Tensor::from_data(data, device)
    }

    /// Picks a random image index with the given class label
    ///
    /// Returns `None` when no image carries that label.
    pub fn sample_class<R: Rng>(&self, class: u8, rng: &mut R) -> Option<usize> {
        let matching: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(index, _)| index)
            .collect();
        matching.choose(rng).copied()
    }
}

/// Mini-batch plan over an [`InMemoryDataset`]
///
/// Walks the dataset in sequential or seeded-shuffle order; the final
/// short batch is kept.
#[derive(Debug)]
pub struct MiniBatches<'a> {
    dataset: &'a InMemoryDataset,
    batch_size: usize,
    order: Vec<usize>,
}

impl<'a> MiniBatches<'a> {
    /// Sequential batches of `batch_size`
    pub fn new(dataset: &'a InMemoryDataset, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            dataset,
            batch_size,
            order: (0..dataset.len()).collect(),
        }
    }

    /// Seeded-shuffle batches of `batch_size`
    pub fn shuffled(dataset: &'a InMemoryDataset, batch_size: usize, seed: u64) -> Self {
        let mut plan = Self::new(dataset, batch_size);
        let mut rng = StdRng::seed_from_u64(seed);
        plan.order.shuffle(&mut rng);
        plan
    }
}

impl<B: Backend> BatchSource<B> for MiniBatches<'_> {
    fn dims(&self) -> ImageDims {
        self.dataset.dims()
    }

    fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }

    fn load_batch(&self, index: usize, device: &B::Device) -> Result<ImageBatch<B>, DataError> {
        let batches = <Self as BatchSource<B>>::num_batches(self);
        if index >= batches {
            return Err(DataError::BatchOutOfRange { index, batches });
        }

        let dims = self.dataset.dims();
        let start = index * self.batch_size;
        let end = (start + self.batch_size).min(self.order.len());
        let indices = &self.order[start..end];

        let len = dims.len();
        let mut pixels = Vec::with_capacity(indices.len() * len);
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            let offset = i * len;
            pixels.extend_from_slice(&self.dataset.pixels[offset..offset + len]);
            labels.push(self.dataset.labels[i]);
        }

        let data = TensorData::new(
            pixels,
            [indices.len(), dims.channels, dims.height, dims.width],
        );
        Ok(ImageBatch {
            images: Tensor::from_data(data, device),
            labels: Some(labels),
        })
    }
}

/// Unlabeled batches of uniform noise images
///
/// Useful for tests and smoke runs where no dataset files are available;
/// each batch is freshly sampled on the requested device.
#[derive(Debug, Clone)]
pub struct SyntheticBatches {
    dims: ImageDims,
    batch_size: usize,
    batches: usize,
}

impl SyntheticBatches {
    pub fn new(dims: ImageDims, batch_size: usize, batches: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            dims,
            batch_size,
            batches,
        }
    }
}

impl<B: Backend> BatchSource<B> for SyntheticBatches {
    fn dims(&self) -> ImageDims {
        self.dims
    }

    fn num_batches(&self) -> usize {
        self.batches
    }

    fn load_batch(&self, index: usize, device: &B::Device) -> Result<ImageBatch<B>, DataError> {
        if index >= self.batches {
            return Err(DataError::BatchOutOfRange {
                index,
                batches: self.batches,
            });
        }
        let images = Tensor::random(
            [
                self.batch_size,
                self.dims.channels,
                self.dims.height,
                self.dims.width,
            ],
            Distribution::Uniform(0.0, 1.0),
            device,
        );
        Ok(ImageBatch {
            images,
            labels: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn tiny_dataset() -> InMemoryDataset {
        // Five 1x2x2 images, pixel value = image index / 10.
        let dims = ImageDims::new(1, 2, 2);
        let pixels: Vec<f32> = (0..5)
            .flat_map(|i| std::iter::repeat(i as f32 / 10.0).take(4))
            .collect();
        InMemoryDataset::new(dims, pixels, vec![0, 1, 0, 1, 2]).unwrap()
    }

    #[test]
    fn test_count_mismatch_is_rejected() {
        let dims = ImageDims::new(1, 2, 2);
        let err = InMemoryDataset::new(dims, vec![0.0; 7], vec![0, 1]).unwrap_err();
        assert!(matches!(err, DataError::CountMismatch { .. }));
    }

    #[test]
    fn test_batches_cover_dataset_with_short_tail() {
        let dataset = tiny_dataset();
        let plan = MiniBatches::new(&dataset, 2);
        let device = Default::default();

        assert_eq!(<MiniBatches as BatchSource<B>>::num_batches(&plan), 3);
        let first = BatchSource::<B>::load_batch(&plan, 0, &device).unwrap();
        assert_eq!(first.images.dims(), [2, 1, 2, 2]);
        let tail = BatchSource::<B>::load_batch(&plan, 2, &device).unwrap();
        assert_eq!(tail.images.dims(), [1, 1, 2, 2]);
        assert_eq!(tail.labels, Some(vec![2]));
    }

    #[test]
    fn test_batch_index_out_of_range() {
        let dataset = tiny_dataset();
        let plan = MiniBatches::new(&dataset, 2);
        let device = Default::default();
        let err = BatchSource::<B>::load_batch(&plan, 3, &device).unwrap_err();
        assert!(matches!(err, DataError::BatchOutOfRange { .. }));
    }

    #[test]
    fn test_shuffle_is_seeded_permutation() {
        let dataset = tiny_dataset();
        let a = MiniBatches::shuffled(&dataset, 2, 7);
        let b = MiniBatches::shuffled(&dataset, 2, 7);
        assert_eq!(a.order, b.order);

        let mut sorted = a.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sample_class_respects_label() {
        let dataset = tiny_dataset();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            let index = dataset.sample_class(1, &mut rng).unwrap();
            assert_eq!(dataset.label(index), 1);
        }
        assert!(dataset.sample_class(9, &mut rng).is_none());
    }

    #[test]
    fn test_synthetic_batches_are_in_unit_interval() {
        let source = SyntheticBatches::new(ImageDims::new(1, 4, 4), 3, 2);
        let device = Default::default();
        let batch = BatchSource::<B>::load_batch(&source, 0, &device).unwrap();
        assert_eq!(batch.images.dims(), [3, 1, 4, 4]);
        assert!(batch.labels.is_none());

        let values: Vec<f32> = batch.images.into_data().convert::<f32>().to_vec().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
