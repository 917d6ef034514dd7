//! DCGAN-style generator
//!
//! Decode-only family: a latent code is projected to a small feature map
//! and upsampled with transposed convolutions. The output sigmoid keeps
//! the pixel convention uniform with the VAE families, so generated images
//! feed the same conversion and display path. Encoding is not part of this
//! family; `encode` returns a typed error rather than panicking, and the
//! explorer surfaces that to the user for reconstruction/interpolation
//! requests.

use burn::nn::conv::{ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{relu, sigmoid};

use burn_vae_lab_core::ImageDims;

use crate::codec::{LatentCodec, ModelError};

/// DCGAN generator configuration
#[derive(Debug, Clone)]
pub struct DcganGeneratorConfig {
    /// Output image shape (height and width divisible by 4)
    pub input: ImageDims,
    /// Feature channels before the last upsampling block
    pub base_channels: usize,
    /// Latent dimensionality
    pub latent: usize,
}

impl DcganGeneratorConfig {
    pub fn new(input: ImageDims, latent: usize) -> Self {
        Self {
            input,
            base_channels: 64,
            latent,
        }
    }

    pub fn with_base_channels(mut self, base_channels: usize) -> Self {
        self.base_channels = base_channels;
        self
    }
}

/// DCGAN-style generator (decode-only)
#[derive(Module, Debug)]
pub struct DcganGenerator<B: Backend> {
    project: Linear<B>,
    deconv1: ConvTranspose2d<B>,
    deconv2: ConvTranspose2d<B>,
    channels: usize,
    height: usize,
    width: usize,
    feat_channels: usize,
    latent: usize,
}

impl<B: Backend> DcganGenerator<B> {
    /// Creates a new generator
    pub fn new(config: &DcganGeneratorConfig, device: &B::Device) -> Self {
        assert!(
            config.input.height % 4 == 0 && config.input.width % 4 == 0,
            "generator needs output sides divisible by 4, got {}x{}",
            config.input.height,
            config.input.width
        );

        let feat_channels = config.base_channels * 2;
        let feat_len = feat_channels * (config.input.height / 4) * (config.input.width / 4);

        let deconv1 = ConvTranspose2dConfig::new([feat_channels, config.base_channels], [4, 4])
            .with_stride([2, 2])
            .with_padding([1, 1])
            .init(device);
        let deconv2 = ConvTranspose2dConfig::new([config.base_channels, config.input.channels], [4, 4])
            .with_stride([2, 2])
            .with_padding([1, 1])
            .init(device);

        Self {
            project: LinearConfig::new(config.latent, feat_len).init(device),
            deconv1,
            deconv2,
            channels: config.input.channels,
            height: config.input.height,
            width: config.input.width,
            feat_channels,
            latent: config.latent,
        }
    }
}

impl<B: Backend> LatentCodec<B> for DcganGenerator<B> {
    fn encode(&self, _images: Tensor<B, 4>) -> Result<(Tensor<B, 2>, Tensor<B, 2>), ModelError> {
        Err(ModelError::Unsupported {
            model: "dcgan generator",
            op: "encode",
        })
    }

    fn decode(&self, latents: Tensor<B, 2>) -> Tensor<B, 4> {
        let [n, _] = latents.dims();

        let h = relu(self.project.forward(latents));
        let h = h.reshape([n, self.feat_channels, self.height / 4, self.width / 4]);
        let h = relu(self.deconv1.forward(h));

        sigmoid(self.deconv2.forward(h))
    }

    fn latent_dim(&self) -> usize {
        self.latent
    }
}
