//! Fully connected VAE
//!
//! Flattens the image, runs one hidden layer, and projects to the mean and
//! log-variance heads; the decoder mirrors the encoder and ends in a
//! sigmoid. Works for any image size, making it the default family for the
//! small latent sizes (down to 2) used to visualize the latent space.

use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{relu, sigmoid};

use burn_vae_lab_core::ImageDims;

use crate::codec::{check_input, LatentCodec, ModelError};

/// Fully connected VAE configuration
#[derive(Debug, Clone)]
pub struct DenseVaeConfig {
    /// Input image shape
    pub input: ImageDims,
    /// Width of the single hidden layer
    pub hidden: usize,
    /// Latent dimensionality
    pub latent: usize,
}

impl DenseVaeConfig {
    pub fn new(input: ImageDims, latent: usize) -> Self {
        Self {
            input,
            hidden: 400,
            latent,
        }
    }

    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Fully connected VAE
#[derive(Module, Debug)]
pub struct DenseVae<B: Backend> {
    enc_fc: Linear<B>,
    fc_mu: Linear<B>,
    fc_log_var: Linear<B>,
    dec_fc: Linear<B>,
    dec_out: Linear<B>,
    channels: usize,
    height: usize,
    width: usize,
    latent: usize,
}

impl<B: Backend> DenseVae<B> {
    /// Creates a new fully connected VAE
    pub fn new(config: &DenseVaeConfig, device: &B::Device) -> Self {
        let features = config.input.len();

        Self {
            enc_fc: LinearConfig::new(features, config.hidden).init(device),
            fc_mu: LinearConfig::new(config.hidden, config.latent).init(device),
            fc_log_var: LinearConfig::new(config.hidden, config.latent).init(device),
            dec_fc: LinearConfig::new(config.latent, config.hidden).init(device),
            dec_out: LinearConfig::new(config.hidden, features).init(device),
            channels: config.input.channels,
            height: config.input.height,
            width: config.input.width,
            latent: config.latent,
        }
    }
}

impl<B: Backend> LatentCodec<B> for DenseVae<B> {
    fn encode(&self, images: Tensor<B, 4>) -> Result<(Tensor<B, 2>, Tensor<B, 2>), ModelError> {
        check_input(&images, self.channels, self.height, self.width)?;

        let x = images.flatten::<2>(1, 3);
        let h = relu(self.enc_fc.forward(x));

        Ok((self.fc_mu.forward(h.clone()), self.fc_log_var.forward(h)))
    }

    fn decode(&self, latents: Tensor<B, 2>) -> Tensor<B, 4> {
        let [n, _] = latents.dims();

        let h = relu(self.dec_fc.forward(latents));
        let flat = sigmoid(self.dec_out.forward(h));

        flat.reshape([n, self.channels, self.height, self.width])
    }

    fn latent_dim(&self) -> usize {
        self.latent
    }
}
