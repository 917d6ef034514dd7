//! Convolutional VAE
//!
//! Two stride-2 convolution blocks compress the image 4x per side before
//! the linear heads; the decoder mirrors them with transposed convolutions
//! and ends in a sigmoid. Input sides must be divisible by 4 (28 and 32
//! both are).

use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation::{relu, sigmoid};

use burn_vae_lab_core::ImageDims;

use crate::codec::{check_input, LatentCodec, ModelError};

/// Convolutional VAE configuration
#[derive(Debug, Clone)]
pub struct ConvVaeConfig {
    /// Input image shape (height and width divisible by 4)
    pub input: ImageDims,
    /// Channels after the first conv block; the second block doubles this
    pub base_channels: usize,
    /// Latent dimensionality
    pub latent: usize,
}

impl ConvVaeConfig {
    pub fn new(input: ImageDims, latent: usize) -> Self {
        Self {
            input,
            base_channels: 32,
            latent,
        }
    }

    pub fn with_base_channels(mut self, base_channels: usize) -> Self {
        self.base_channels = base_channels;
        self
    }
}

/// Convolutional VAE
#[derive(Module, Debug)]
pub struct ConvVae<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    fc_mu: Linear<B>,
    fc_log_var: Linear<B>,
    dec_fc: Linear<B>,
    deconv1: ConvTranspose2d<B>,
    deconv2: ConvTranspose2d<B>,
    channels: usize,
    height: usize,
    width: usize,
    feat_channels: usize,
    latent: usize,
}

impl<B: Backend> ConvVae<B> {
    /// Creates a new convolutional VAE
    pub fn new(config: &ConvVaeConfig, device: &B::Device) -> Self {
        assert!(
            config.input.height % 4 == 0 && config.input.width % 4 == 0,
            "conv VAE needs input sides divisible by 4, got {}x{}",
            config.input.height,
            config.input.width
        );

        let base = config.base_channels;
        let feat_channels = base * 2;
        let feat_len = feat_channels * (config.input.height / 4) * (config.input.width / 4);

        // 4x4 kernel, stride 2, padding 1 halves each side exactly
        let conv1 = Conv2dConfig::new([config.input.channels, base], [4, 4])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([base, feat_channels], [4, 4])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        let deconv1 = ConvTranspose2dConfig::new([feat_channels, base], [4, 4])
            .with_stride([2, 2])
            .with_padding([1, 1])
            .init(device);
        let deconv2 = ConvTranspose2dConfig::new([base, config.input.channels], [4, 4])
            .with_stride([2, 2])
            .with_padding([1, 1])
            .init(device);

        Self {
            conv1,
            conv2,
            fc_mu: LinearConfig::new(feat_len, config.latent).init(device),
            fc_log_var: LinearConfig::new(feat_len, config.latent).init(device),
            dec_fc: LinearConfig::new(config.latent, feat_len).init(device),
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

impl<B: Backend> LatentCodec<B> for ConvVae<B> {
    fn encode(&self, images: Tensor<B, 4>) -> Result<(Tensor<B, 2>, Tensor<B, 2>), ModelError> {
        check_input(&images, self.channels, self.height, self.width)?;

        let h = relu(self.conv1.forward(images));
        let h = relu(self.conv2.forward(h));
        let h = h.flatten::<2>(1, 3);

        Ok((self.fc_mu.forward(h.clone()), self.fc_log_var.forward(h)))
    }

    fn decode(&self, latents: Tensor<B, 2>) -> Tensor<B, 4> {
        let [n, _] = latents.dims();

        let h = relu(self.dec_fc.forward(latents));
        let h = h.reshape([n, self.feat_channels, self.height / 4, self.width / 4]);
        let h = relu(self.deconv1.forward(h));

        sigmoid(self.deconv2.forward(h))
    }

    fn latent_dim(&self) -> usize {
        self.latent
    }
}
