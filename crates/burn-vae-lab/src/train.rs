//! Mini-batch gradient-descent driver for the VAE objective
//!
//! For each epoch, for each batch: forward pass (encode, reparameterize,
//! decode), loss per the reconstruction/divergence objective, backward,
//! Adam step. The running loss is accumulated per epoch; weights are
//! persisted only when the configuration asks for it.
//!
//! There is no retry or recovery logic: a malformed batch or an
//! unsupported model operation terminates the run as a fatal error.

use std::path::{Path, PathBuf};

use burn::module::{AutodiffModule, Module};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use thiserror::Error;

use burn_vae_lab_core::loss::{vae_loss, LossError, ReconKind};
use burn_vae_lab_data::{BatchSource, DataError};
use burn_vae_lab_models::codec::{LatentCodec, ModelError};

use crate::checkpoint::{default_recorder, CheckpointError};

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of passes over the data source
    pub epochs: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Weight on the reconstruction term
    pub alpha: f64,
    /// Reconstruction-term variant
    pub recon: ReconKind,
    /// When set, weights are persisted to this extension-less stem after
    /// the final epoch
    pub checkpoint: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            learning_rate: 1e-3,
            alpha: 1.0,
            recon: ReconKind::default(),
            checkpoint: None,
        }
    }
}

impl TrainConfig {
    pub fn new(epochs: usize) -> Self {
        Self {
            epochs,
            ..Default::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_recon(mut self, recon: ReconKind) -> Self {
        self.recon = recon;
        self
    }

    pub fn with_checkpoint(mut self, stem: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(stem.into());
        self
    }
}

/// Error type for a training run
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("data source yielded no batches")]
    EmptySource,

    #[error("loss error: {0}")]
    Loss(#[from] LossError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("failed to persist weights: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Per-run loss bookkeeping
#[derive(Debug, Clone, Default)]
pub struct TrainReport {
    /// Mean total loss per epoch, in epoch order
    pub epoch_losses: Vec<f32>,
}

impl TrainReport {
    /// Mean total loss of the final epoch
    pub fn final_loss(&self) -> Option<f32> {
        self.epoch_losses.last().copied()
    }
}

/// A trained model and its report
#[derive(Debug)]
pub struct Trained<M> {
    pub model: M,
    pub report: TrainReport,
}

impl<M> Trained<M> {
    /// Persists the trained weights to the extension-less `stem`
    ///
    /// Available independently of `TrainConfig::checkpoint`, so a caller
    /// can keep the in-memory weights even when the first save target
    /// turns out to be unwritable.
    pub fn save<B: Backend>(&self, stem: &Path) -> Result<(), CheckpointError>
    where
        M: Module<B>,
    {
        self.model
            .clone()
            .save_file(stem.to_path_buf(), &default_recorder())?;
        Ok(())
    }
}

/// Runs standard mini-batch gradient descent over `source`
///
/// See [`train_with`] for a variant with an epoch observer.
pub fn train<B, M, S>(
    model: M,
    source: &S,
    device: &B::Device,
    config: &TrainConfig,
) -> Result<Trained<M>, TrainError>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + LatentCodec<B>,
    S: BatchSource<B> + ?Sized,
{
    train_with(model, source, device, config, |_, _| {})
}

/// [`train`] with an observer called after each epoch with
/// `(epoch_index, mean_total_loss)`
pub fn train_with<B, M, S>(
    model: M,
    source: &S,
    device: &B::Device,
    config: &TrainConfig,
    mut on_epoch: impl FnMut(usize, f32),
) -> Result<Trained<M>, TrainError>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + LatentCodec<B>,
    S: BatchSource<B> + ?Sized,
{
    let num_batches = source.num_batches();
    if num_batches == 0 {
        return Err(TrainError::EmptySource);
    }

    let mut model = model;
    let mut optim = AdamConfig::new().init();
    let mut report = TrainReport::default();

    for epoch in 0..config.epochs {
        let mut running = 0.0f64;

        for index in 0..num_batches {
            let batch = source.load_batch(index, device)?;
            let out = model.forward(batch.images.clone())?;
            let loss = vae_loss(
                config.recon,
                out.recon,
                batch.images,
                out.mu,
                out.log_var,
                config.alpha,
            )?;

            running += loss.total.clone().into_scalar().elem::<f32>() as f64;

            let grads = loss.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(config.learning_rate, model, grads);
        }

        let mean = (running / num_batches as f64) as f32;
        report.epoch_losses.push(mean);
        on_epoch(epoch, mean);
    }

    let trained = Trained { model, report };
    if let Some(stem) = &config.checkpoint {
        trained.save(stem)?;
    }
    Ok(trained)
}
