//! VAE training objective: reconstruction term + KL divergence
//!
//! The objective is a weighted sum of a reconstruction term and the
//! closed-form KL divergence between the approximate posterior
//! `N(mu, exp(log_var))` and the standard normal prior:
//!
//! ```text
//! total = alpha * recon + kl
//! kl    = mean_batch( sum_dims( 0.5 * (exp(log_var) + mu^2 - 1 - log_var) ) )
//! ```
//!
//! Two reconstruction variants are supported, selectable independently of
//! the divergence term:
//!
//! - [`ReconKind::BinaryCrossEntropy`]: reconstructed pixels are Bernoulli
//!   probabilities in `[0, 1]` (the decoders end in a sigmoid). Cross-entropy
//!   is summed over a sample's pixels. Probabilities are clamped to
//!   `[PROB_EPSILON, 1 - PROB_EPSILON]` before the logs, so exact 0/1 pixels
//!   stay finite.
//! - [`ReconKind::MeanSquaredError`]: mean squared pixel-wise difference
//!   over a sample.
//!
//! Every term is averaged over the batch, so the two terms are reduced with
//! the same convention and `total == alpha * recon + kl` holds exactly (up
//! to the arithmetic's own rounding).

use burn::prelude::*;
use thiserror::Error;

/// Clamp bound applied to reconstructed probabilities before taking logs
pub const PROB_EPSILON: f64 = 1e-7;

/// Error type for loss computation
#[derive(Debug, Error)]
pub enum LossError {
    /// Reconstruction and original batches disagree in shape
    #[error("shape mismatch: reconstruction {recon:?}, target {target:?}")]
    ShapeMismatch {
        recon: Vec<usize>,
        target: Vec<usize>,
    },

    /// Mean and log-variance batches disagree in shape
    #[error("latent shape mismatch: mu {mu:?}, log_var {log_var:?}")]
    LatentShapeMismatch {
        mu: Vec<usize>,
        log_var: Vec<usize>,
    },

    /// Image batch and latent batch disagree in batch size
    #[error("batch size mismatch: {images} images, {latents} latent rows")]
    BatchSizeMismatch { images: usize, latents: usize },
}

/// Reconstruction-term variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconKind {
    /// Per-pixel Bernoulli cross-entropy, summed over a sample's pixels
    #[default]
    BinaryCrossEntropy,
    /// Mean squared pixel-wise difference over a sample
    MeanSquaredError,
}

impl ReconKind {
    /// Short name for display and file naming
    pub fn name(&self) -> &'static str {
        match self {
            ReconKind::BinaryCrossEntropy => "bce",
            ReconKind::MeanSquaredError => "mse",
        }
    }
}

/// Decomposed loss value for one batch
///
/// The components are kept as scalar tensors so `total` can drive
/// `backward()` during training and callers can log both parts separately.
#[derive(Debug, Clone)]
pub struct VaeLoss<B: Backend> {
    /// `alpha * recon + kl`
    pub total: Tensor<B, 1>,
    /// Reconstruction term (unweighted)
    pub recon: Tensor<B, 1>,
    /// KL divergence term
    pub kl: Tensor<B, 1>,
}

/// Computes the VAE objective for one batch
///
/// # Arguments
///
/// * `kind` - reconstruction-term variant
/// * `recon` - reconstructed batch `[n, c, h, w]`, values in `[0, 1]`
/// * `target` - original batch `[n, c, h, w]`, values in `[0, 1]`
/// * `mu` - posterior means `[n, latent]`
/// * `log_var` - posterior log-variances `[n, latent]`
/// * `alpha` - weight on the reconstruction term
pub fn vae_loss<B: Backend>(
    kind: ReconKind,
    recon: Tensor<B, 4>,
    target: Tensor<B, 4>,
    mu: Tensor<B, 2>,
    log_var: Tensor<B, 2>,
    alpha: f64,
) -> Result<VaeLoss<B>, LossError> {
    validate_shapes(&recon, &target, &mu, &log_var)?;

    let recon_term = match kind {
        ReconKind::BinaryCrossEntropy => bce_term(recon, target),
        ReconKind::MeanSquaredError => mse_term(recon, target),
    };
    let kl = kl_divergence(mu, log_var);

    // The defining contract: total is literally this expression.
    let total = recon_term.clone() * alpha + kl.clone();

    Ok(VaeLoss {
        total,
        recon: recon_term,
        kl,
    })
}

/// Binary-cross-entropy variant of [`vae_loss`]
pub fn bce_vae_loss<B: Backend>(
    recon: Tensor<B, 4>,
    target: Tensor<B, 4>,
    mu: Tensor<B, 2>,
    log_var: Tensor<B, 2>,
    alpha: f64,
) -> Result<VaeLoss<B>, LossError> {
    vae_loss(ReconKind::BinaryCrossEntropy, recon, target, mu, log_var, alpha)
}

/// Squared-error variant of [`vae_loss`]
pub fn mse_vae_loss<B: Backend>(
    recon: Tensor<B, 4>,
    target: Tensor<B, 4>,
    mu: Tensor<B, 2>,
    log_var: Tensor<B, 2>,
    alpha: f64,
) -> Result<VaeLoss<B>, LossError> {
    vae_loss(ReconKind::MeanSquaredError, recon, target, mu, log_var, alpha)
}

/// Closed-form KL divergence against the standard normal prior
///
/// Per latent dimension: `0.5 * (exp(log_var) + mu^2 - 1 - log_var)`,
/// summed over dimensions, averaged over the batch. Zero exactly when
/// `mu = 0` and `log_var = 0`; non-negative for all finite inputs.
pub fn kl_divergence<B: Backend>(mu: Tensor<B, 2>, log_var: Tensor<B, 2>) -> Tensor<B, 1> {
    let per_dim = (log_var.clone().exp() + mu.powf_scalar(2.0) - log_var - 1.0) * 0.5;
    per_dim.sum_dim(1).mean()
}

fn bce_term<B: Backend>(recon: Tensor<B, 4>, target: Tensor<B, 4>) -> Tensor<B, 1> {
    let p = recon.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
    let ce = (target.clone() * p.clone().log() + (target.neg() + 1.0) * (p.neg() + 1.0).log()).neg();
    ce.flatten::<2>(1, 3).sum_dim(1).mean()
}

fn mse_term<B: Backend>(recon: Tensor<B, 4>, target: Tensor<B, 4>) -> Tensor<B, 1> {
    (recon - target).powf_scalar(2.0).flatten::<2>(1, 3).mean_dim(1).mean()
}

fn validate_shapes<B: Backend>(
    recon: &Tensor<B, 4>,
    target: &Tensor<B, 4>,
    mu: &Tensor<B, 2>,
    log_var: &Tensor<B, 2>,
) -> Result<(), LossError> {
    if recon.dims() != target.dims() {
        return Err(LossError::ShapeMismatch {
            recon: recon.dims().to_vec(),
            target: target.dims().to_vec(),
        });
    }
    if mu.dims() != log_var.dims() {
        return Err(LossError::LatentShapeMismatch {
            mu: mu.dims().to_vec(),
            log_var: log_var.dims().to_vec(),
        });
    }
    let [images, _, _, _] = recon.dims();
    let [latents, _] = mu.dims();
    if images != latents {
        return Err(LossError::BatchSizeMismatch { images, latents });
    }
    Ok(())
}
