//! Explicit model-family registry
//!
//! Selection happens through [`ModelKind`] and [`AnyModel`] enum dispatch:
//! adding a family means adding a variant here, not resolving names
//! dynamically.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use burn::prelude::*;
use burn::record::{FileRecorder, RecorderError};

use burn_vae_lab_core::ImageDims;

use crate::codec::{LatentCodec, ModelError};
use crate::conv::{ConvVae, ConvVaeConfig};
use crate::dense::{DenseVae, DenseVaeConfig};
use crate::gan::{DcganGenerator, DcganGeneratorConfig};

/// Model family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelKind {
    /// Fully connected VAE
    #[default]
    DenseVae,
    /// Convolutional VAE
    ConvVae,
    /// DCGAN-style generator (decode-only)
    Dcgan,
}

impl ModelKind {
    /// All families, in display order
    pub const ALL: [ModelKind; 3] = [ModelKind::DenseVae, ModelKind::ConvVae, ModelKind::Dcgan];

    /// Short name for display and checkpoint naming
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::DenseVae => "dense-vae",
            ModelKind::ConvVae => "conv-vae",
            ModelKind::Dcgan => "dcgan",
        }
    }

    /// Whether the family can encode (reconstruction and interpolation
    /// need this)
    pub fn supports_encode(&self) -> bool {
        !matches!(self, ModelKind::Dcgan)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown model family: {s}"))
    }
}

/// A model of any family, dispatching [`LatentCodec`] by variant
#[derive(Debug, Clone)]
pub enum AnyModel<B: Backend> {
    Dense(DenseVae<B>),
    Conv(ConvVae<B>),
    Dcgan(DcganGenerator<B>),
}

impl<B: Backend> AnyModel<B> {
    /// The family this model belongs to
    pub fn kind(&self) -> ModelKind {
        match self {
            AnyModel::Dense(_) => ModelKind::DenseVae,
            AnyModel::Conv(_) => ModelKind::ConvVae,
            AnyModel::Dcgan(_) => ModelKind::Dcgan,
        }
    }

    /// Restores the model's weights from a record file
    ///
    /// The recorder appends its own file extension to `path`.
    pub fn load_file<R: FileRecorder<B>>(
        self,
        path: &Path,
        recorder: &R,
        device: &B::Device,
    ) -> Result<Self, RecorderError> {
        Ok(match self {
            AnyModel::Dense(m) => {
                AnyModel::Dense(m.load_file(path.to_path_buf(), recorder, device)?)
            }
            AnyModel::Conv(m) => AnyModel::Conv(m.load_file(path.to_path_buf(), recorder, device)?),
            AnyModel::Dcgan(m) => {
                AnyModel::Dcgan(m.load_file(path.to_path_buf(), recorder, device)?)
            }
        })
    }

    /// Persists the model's weights to a record file
    ///
    /// The recorder appends its own file extension to `path`.
    pub fn save_file<R: FileRecorder<B>>(
        self,
        path: &Path,
        recorder: &R,
    ) -> Result<(), RecorderError> {
        match self {
            AnyModel::Dense(m) => m.save_file(path.to_path_buf(), recorder),
            AnyModel::Conv(m) => m.save_file(path.to_path_buf(), recorder),
            AnyModel::Dcgan(m) => m.save_file(path.to_path_buf(), recorder),
        }
    }
}

impl<B: Backend> LatentCodec<B> for AnyModel<B> {
    fn encode(&self, images: Tensor<B, 4>) -> Result<(Tensor<B, 2>, Tensor<B, 2>), ModelError> {
        match self {
            AnyModel::Dense(m) => m.encode(images),
            AnyModel::Conv(m) => m.encode(images),
            AnyModel::Dcgan(m) => m.encode(images),
        }
    }

    fn decode(&self, latents: Tensor<B, 2>) -> Tensor<B, 4> {
        match self {
            AnyModel::Dense(m) => m.decode(latents),
            AnyModel::Conv(m) => m.decode(latents),
            AnyModel::Dcgan(m) => m.decode(latents),
        }
    }

    fn latent_dim(&self) -> usize {
        match self {
            AnyModel::Dense(m) => m.latent_dim(),
            AnyModel::Conv(m) => m.latent_dim(),
            AnyModel::Dcgan(m) => m.latent_dim(),
        }
    }
}

/// Builds a freshly initialized model of the given family
pub fn build_model<B: Backend>(
    kind: ModelKind,
    input: ImageDims,
    latent: usize,
    device: &B::Device,
) -> AnyModel<B> {
    match kind {
        ModelKind::DenseVae => {
            AnyModel::Dense(DenseVae::new(&DenseVaeConfig::new(input, latent), device))
        }
        ModelKind::ConvVae => {
            AnyModel::Conv(ConvVae::new(&ConvVaeConfig::new(input, latent), device))
        }
        ModelKind::Dcgan => AnyModel::Dcgan(DcganGenerator::new(
            &DcganGeneratorConfig::new(input, latent),
            device,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
        }
        assert!("resnet".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_build_dispatches_by_kind() {
        let device = Default::default();
        let dims = ImageDims::new(1, 28, 28);
        for kind in ModelKind::ALL {
            let model = build_model::<B>(kind, dims, 16, &device);
            assert_eq!(model.kind(), kind);
            assert_eq!(model.latent_dim(), 16);
        }
    }

    #[test]
    fn test_encode_support_matches_kind() {
        let device = Default::default();
        let dims = ImageDims::new(1, 28, 28);
        let images = Tensor::<B, 4>::zeros([1, 1, 28, 28], &device);

        for kind in ModelKind::ALL {
            let model = build_model::<B>(kind, dims, 8, &device);
            assert_eq!(model.encode(images.clone()).is_ok(), kind.supports_encode());
        }
    }
}
