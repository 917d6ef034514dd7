//! Interactive exploration over trained models
//!
//! [`Explorer`] is the inference pipeline behind the three exploration
//! operations: random generation from the latent prior, reconstruction of
//! a sampled class image, and latent-space interpolation between two
//! sampled images.
//!
//! It is an explicitly constructed dependency: build it once at process
//! start, register (or load) the models and datasets it should serve, and
//! pass it to whatever drives it. There is no process-wide cache. Each
//! operation is one synchronous call.

use std::collections::HashMap;
use std::path::Path;

use burn::prelude::*;
use burn::tensor::Distribution;
use rand::Rng;
use thiserror::Error;

use burn_vae_lab_core::interpolate::{interpolate_latents, InterpolationConfig};
use burn_vae_lab_data::{DataError, DatasetKind, InMemoryDataset};
use burn_vae_lab_models::codec::{LatentCodec, ModelError};
use burn_vae_lab_models::registry::{build_model, AnyModel, ModelKind};

use crate::checkpoint::{checkpoint_file, checkpoint_path, default_recorder, CheckpointError};

/// Everything that identifies one trained model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelSpec {
    pub kind: ModelKind,
    pub dataset: DatasetKind,
    pub latent: usize,
}

impl ModelSpec {
    pub fn new(kind: ModelKind, dataset: DatasetKind, latent: usize) -> Self {
        Self {
            kind,
            dataset,
            latent,
        }
    }
}

/// Error type for exploration operations
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("no model registered for {kind} on {dataset} with latent size {latent}")]
    ModelNotLoaded {
        kind: ModelKind,
        dataset: DatasetKind,
        latent: usize,
    },

    #[error("no dataset registered for {0}")]
    DatasetNotLoaded(DatasetKind),

    #[error("class index {class} out of range for {dataset} ({classes} classes)")]
    UnknownClass {
        dataset: DatasetKind,
        class: usize,
        classes: usize,
    },

    #[error("no image with class index {class} in {dataset}")]
    EmptyClass { dataset: DatasetKind, class: usize },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// The inference pipeline
pub struct Explorer<B: Backend> {
    models: HashMap<ModelSpec, AnyModel<B>>,
    datasets: HashMap<DatasetKind, InMemoryDataset>,
    device: B::Device,
}

impl<B: Backend> Explorer<B> {
    /// Creates an explorer with empty registries
    pub fn new(device: B::Device) -> Self {
        Self {
            models: HashMap::new(),
            datasets: HashMap::new(),
            device,
        }
    }

    /// The device operations run on
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Registers an already constructed model
    pub fn register_model(&mut self, spec: ModelSpec, model: AnyModel<B>) {
        self.models.insert(spec, model);
    }

    /// Builds the architecture for `spec` and restores its weights from
    /// `checkpoint_dir`
    pub fn load_model(&mut self, spec: ModelSpec, checkpoint_dir: &Path) -> Result<(), ExplorerError> {
        let file = checkpoint_file(checkpoint_dir, spec.kind, spec.dataset, spec.latent);
        if !file.exists() {
            return Err(CheckpointError::NotFound(file).into());
        }

        let stem = checkpoint_path(checkpoint_dir, spec.kind, spec.dataset, spec.latent);
        let model = build_model(spec.kind, spec.dataset.dims(), spec.latent, &self.device)
            .load_file(&stem, &default_recorder(), &self.device)
            .map_err(CheckpointError::from)?;

        self.models.insert(spec, model);
        Ok(())
    }

    /// Registers an already loaded dataset
    pub fn register_dataset(&mut self, kind: DatasetKind, dataset: InMemoryDataset) {
        self.datasets.insert(kind, dataset);
    }

    /// Loads the dataset files for `kind` from its directory
    pub fn load_dataset(&mut self, kind: DatasetKind, dir: &Path) -> Result<(), ExplorerError> {
        let dataset = InMemoryDataset::from_dir(kind, dir)?;
        self.datasets.insert(kind, dataset);
        Ok(())
    }

    fn model(&self, spec: ModelSpec) -> Result<&AnyModel<B>, ExplorerError> {
        self.models
            .get(&spec)
            .ok_or(ExplorerError::ModelNotLoaded {
                kind: spec.kind,
                dataset: spec.dataset,
                latent: spec.latent,
            })
    }

    fn dataset(&self, kind: DatasetKind) -> Result<&InMemoryDataset, ExplorerError> {
        self.datasets
            .get(&kind)
            .ok_or(ExplorerError::DatasetNotLoaded(kind))
    }

    /// Decodes a random sample from the standard normal prior
    pub fn generate(&self, spec: ModelSpec) -> Result<Tensor<B, 3>, ExplorerError> {
        let model = self.model(spec)?;
        let z = Tensor::random(
            [1, model.latent_dim()],
            Distribution::Normal(0.0, 1.0),
            &self.device,
        );
        Ok(model.decode(z).squeeze::<3>(0))
    }

    /// Draws a random image of the given class from a registered dataset
    pub fn sample_image<R: Rng>(
        &self,
        dataset: DatasetKind,
        class: usize,
        rng: &mut R,
    ) -> Result<Tensor<B, 3>, ExplorerError> {
        let classes = dataset.num_classes();
        if class >= classes {
            return Err(ExplorerError::UnknownClass {
                dataset,
                class,
                classes,
            });
        }

        let data = self.dataset(dataset)?;
        let index = data
            .sample_class(class as u8, rng)
            .ok_or(ExplorerError::EmptyClass { dataset, class })?;
        Ok(data.image(index, &self.device))
    }

    /// Encodes an image to its posterior mean and decodes it back
    ///
    /// Deterministic: no latent sampling, so repeated calls agree.
    pub fn reconstruct(
        &self,
        spec: ModelSpec,
        image: Tensor<B, 3>,
    ) -> Result<Tensor<B, 3>, ExplorerError> {
        let model = self.model(spec)?;
        let (mu, _log_var) = model.encode(image.unsqueeze::<4>())?;
        Ok(model.decode(mu).squeeze::<3>(0))
    }

    /// Interpolates between two images in latent space
    ///
    /// Both endpoints are encoded to their posterior means, the latent walk
    /// follows `config`, and every step is decoded. Returns one `[c, h, w]`
    /// frame per step.
    pub fn interpolate(
        &self,
        spec: ModelSpec,
        first: Tensor<B, 3>,
        second: Tensor<B, 3>,
        config: &InterpolationConfig,
    ) -> Result<Vec<Tensor<B, 3>>, ExplorerError> {
        let model = self.model(spec)?;
        let (mu_first, _) = model.encode(first.unsqueeze::<4>())?;
        let (mu_second, _) = model.encode(second.unsqueeze::<4>())?;

        let frames = interpolate_latents(mu_first, mu_second, config)
            .into_iter()
            .map(|z| model.decode(z).squeeze::<3>(0))
            .collect();
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use burn_vae_lab_core::ImageDims;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type B = NdArray<f32>;

    fn explorer_with_dense_model() -> (Explorer<B>, ModelSpec) {
        let device = Default::default();
        let mut explorer = Explorer::<B>::new(device);

        let spec = ModelSpec::new(ModelKind::DenseVae, DatasetKind::Mnist, 4);
        let model = build_model(spec.kind, spec.dataset.dims(), spec.latent, explorer.device());
        explorer.register_model(spec, model);
        (explorer, spec)
    }

    fn tiny_mnist() -> InMemoryDataset {
        let dims = ImageDims::new(1, 28, 28);
        let pixels = vec![0.5f32; dims.len() * 4];
        InMemoryDataset::new(dims, pixels, vec![0, 1, 1, 3]).unwrap()
    }

    #[test]
    fn test_generate_produces_one_image() {
        let (explorer, spec) = explorer_with_dense_model();
        let image = explorer.generate(spec).unwrap();
        assert_eq!(image.dims(), [1, 28, 28]);
    }

    #[test]
    fn test_missing_model_is_reported() {
        let device = Default::default();
        let explorer = Explorer::<B>::new(device);
        let spec = ModelSpec::new(ModelKind::ConvVae, DatasetKind::Cifar10, 64);
        let err = explorer.generate(spec).unwrap_err();
        assert!(matches!(err, ExplorerError::ModelNotLoaded { .. }));
    }

    #[test]
    fn test_reconstruct_is_deterministic() {
        let (mut explorer, spec) = explorer_with_dense_model();
        explorer.register_dataset(DatasetKind::Mnist, tiny_mnist());

        let mut rng = StdRng::seed_from_u64(3);
        let image = explorer
            .sample_image(DatasetKind::Mnist, 1, &mut rng)
            .unwrap();

        let a = explorer.reconstruct(spec, image.clone()).unwrap();
        let b = explorer.reconstruct(spec, image).unwrap();
        let a: Vec<f32> = a.into_data().convert::<f32>().to_vec().unwrap();
        let b: Vec<f32> = b.into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_interpolation_frame_count() {
        let (mut explorer, spec) = explorer_with_dense_model();
        explorer.register_dataset(DatasetKind::Mnist, tiny_mnist());

        let mut rng = StdRng::seed_from_u64(5);
        let first = explorer
            .sample_image(DatasetKind::Mnist, 0, &mut rng)
            .unwrap();
        let second = explorer
            .sample_image(DatasetKind::Mnist, 3, &mut rng)
            .unwrap();

        let config = InterpolationConfig::new(4);
        let frames = explorer.interpolate(spec, first, second, &config).unwrap();
        assert_eq!(frames.len(), config.output_frames());
        assert!(frames.iter().all(|f| f.dims() == [1, 28, 28]));
    }

    #[test]
    fn test_decode_only_model_cannot_reconstruct() {
        let device = Default::default();
        let mut explorer = Explorer::<B>::new(device);
        let spec = ModelSpec::new(ModelKind::Dcgan, DatasetKind::Mnist, 8);
        let model = build_model(spec.kind, spec.dataset.dims(), spec.latent, explorer.device());
        explorer.register_model(spec, model);

        let image = Tensor::zeros([1, 28, 28], explorer.device());
        let err = explorer.reconstruct(spec, image).unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::Model(ModelError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let (mut explorer, _) = explorer_with_dense_model();
        explorer.register_dataset(DatasetKind::Mnist, tiny_mnist());

        let mut rng = StdRng::seed_from_u64(0);
        let err = explorer
            .sample_image(DatasetKind::Mnist, 10, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ExplorerError::UnknownClass { .. }));

        let err = explorer
            .sample_image(DatasetKind::Mnist, 2, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ExplorerError::EmptyClass { .. }));
    }
}
