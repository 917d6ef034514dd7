//! The encode/decode capability interface shared by all model families

use burn::prelude::*;
use burn::tensor::Distribution;
use thiserror::Error;

/// Error type for model operations
#[derive(Debug, Error)]
pub enum ModelError {
    /// The family does not implement the requested operation
    /// (e.g. encoding with a decode-only generator)
    #[error("{model} does not support {op}")]
    Unsupported {
        model: &'static str,
        op: &'static str,
    },

    /// Input batch shape disagrees with the model's configured input size
    #[error("input shape {actual:?} does not match expected {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// One forward pass through a VAE: reconstruction plus the latent
/// distribution parameters that produced it
#[derive(Debug, Clone)]
pub struct VaeOutput<B: Backend> {
    /// Reconstructed batch `[n, c, h, w]`, values in `[0, 1]`
    pub recon: Tensor<B, 4>,
    /// Posterior means `[n, latent]`
    pub mu: Tensor<B, 2>,
    /// Posterior log-variances `[n, latent]`
    pub log_var: Tensor<B, 2>,
}

/// Samples a latent code from `N(mu, exp(log_var))` via the
/// reparameterization trick: `z = mu + exp(0.5 * log_var) * noise`
pub fn reparameterize<B: Backend>(mu: Tensor<B, 2>, log_var: Tensor<B, 2>) -> Tensor<B, 2> {
    let noise = Tensor::random(mu.shape(), Distribution::Normal(0.0, 1.0), &mu.device());
    let std = (log_var * 0.5).exp();
    mu + std * noise
}

/// Capability interface over a latent-variable image model
///
/// The rest of the workspace (training driver, explorer, CLI) only sees
/// this trait; which family sits behind it is an explicit registry
/// decision.
pub trait LatentCodec<B: Backend> {
    /// Encodes an image batch `[n, c, h, w]` to posterior parameters
    /// `(mu, log_var)`, each `[n, latent]`
    fn encode(&self, images: Tensor<B, 4>) -> Result<(Tensor<B, 2>, Tensor<B, 2>), ModelError>;

    /// Decodes latent codes `[n, latent]` to an image batch `[n, c, h, w]`
    /// with values in `[0, 1]`
    fn decode(&self, latents: Tensor<B, 2>) -> Tensor<B, 4>;

    /// Latent dimensionality
    fn latent_dim(&self) -> usize;

    /// Full pass: encode, sample with [`reparameterize`], decode
    fn forward(&self, images: Tensor<B, 4>) -> Result<VaeOutput<B>, ModelError> {
        let (mu, log_var) = self.encode(images)?;
        let z = reparameterize(mu.clone(), log_var.clone());
        let recon = self.decode(z);
        Ok(VaeOutput {
            recon,
            mu,
            log_var,
        })
    }
}

/// Shape check shared by the encoder implementations
pub(crate) fn check_input<B: Backend>(
    images: &Tensor<B, 4>,
    channels: usize,
    height: usize,
    width: usize,
) -> Result<(), ModelError> {
    let [_, c, h, w] = images.dims();
    if [c, h, w] != [channels, height, width] {
        return Err(ModelError::ShapeMismatch {
            expected: vec![channels, height, width],
            actual: vec![c, h, w],
        });
    }
    Ok(())
}
