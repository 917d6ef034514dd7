//! vae-lab CLI
//!
//! Command-line surface over the training driver and the explorer:
//!
//! - `train` - fit a model on one of the toy datasets
//! - `generate` - decode a random sample from the latent prior
//! - `reconstruct` - sample a class image and reconstruct it
//! - `interpolate` - walk the latent space between two sampled images
//! - `classes` - list the class names of a dataset

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::{imageops, ImageBuffer, Rgb};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use burn_vae_lab::backends::{default_device, Autodiff, DefaultBackend};
use burn_vae_lab::checkpoint::checkpoint_path;
use burn_vae_lab::core::convert::{hstack, tensor_to_rgb8};
use burn_vae_lab::core::interpolate::{InterpolationConfig, InterpolationMethod};
use burn_vae_lab::core::loss::ReconKind;
use burn_vae_lab::data::{BatchSource, DatasetKind, InMemoryDataset, MiniBatches, SyntheticBatches};
use burn_vae_lab::models::codec::LatentCodec;
use burn_vae_lab::models::{ConvVae, ConvVaeConfig, DenseVae, DenseVaeConfig, ModelKind};
use burn_vae_lab::train::{train_with, TrainConfig};
use burn_vae_lab::{Explorer, ModelSpec};

type InferBackend = DefaultBackend;
type TrainBackend = Autodiff<DefaultBackend>;

/// Reconstruction-loss variant
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LossArg {
    /// Binary cross-entropy (pixels as Bernoulli probabilities)
    Bce,
    /// Mean squared error
    Mse,
}

impl LossArg {
    fn kind(self) -> ReconKind {
        match self {
            LossArg::Bce => ReconKind::BinaryCrossEntropy,
            LossArg::Mse => ReconKind::MeanSquaredError,
        }
    }
}

/// Latent interpolation method
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Linear,
    Slerp,
    Cosine,
}

impl MethodArg {
    fn method(self) -> InterpolationMethod {
        match self {
            MethodArg::Linear => InterpolationMethod::Linear,
            MethodArg::Slerp => InterpolationMethod::Slerp,
            MethodArg::Cosine => InterpolationMethod::Cosine,
        }
    }
}

/// Which trained model to use
#[derive(Debug, Args)]
struct ModelSelection {
    /// Model family (dense-vae, conv-vae, dcgan)
    #[arg(long, default_value = "dense-vae")]
    model: ModelKind,

    /// Dataset (mnist, fmnist, cifar10)
    #[arg(long, default_value = "mnist")]
    dataset: DatasetKind,

    /// Latent size (the demo presets are 2, 32, 64 and 128)
    #[arg(long, default_value_t = 32)]
    latent: usize,
}

impl ModelSelection {
    fn spec(&self) -> ModelSpec {
        ModelSpec::new(self.model, self.dataset, self.latent)
    }
}

#[derive(Parser)]
#[command(name = "vae-lab")]
#[command(about = "Train and explore small generative image models on toy datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and optionally persist its weights
    Train {
        #[command(flatten)]
        selection: ModelSelection,

        /// Number of epochs
        #[arg(long, default_value_t = 10)]
        epochs: usize,

        /// Mini-batch size
        #[arg(long, default_value_t = 128)]
        batch_size: usize,

        /// Adam learning rate
        #[arg(long, default_value_t = 1e-3)]
        learning_rate: f64,

        /// Weight on the reconstruction term
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,

        /// Reconstruction-loss variant
        #[arg(long, value_enum, default_value_t = LossArg::Bce)]
        loss: LossArg,

        /// Directory holding one subdirectory per dataset
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Train on synthetic noise batches instead of dataset files
        /// (smoke runs)
        #[arg(long)]
        synthetic: bool,

        /// Shuffle batches with this seed (sequential order otherwise)
        #[arg(long)]
        shuffle_seed: Option<u64>,

        /// Persist the trained weights under the checkpoint directory
        #[arg(long)]
        save: bool,

        /// Where checkpoints live
        #[arg(long, default_value = "checkpoints")]
        checkpoint_dir: PathBuf,
    },

    /// Decode a random sample from the latent prior
    Generate {
        #[command(flatten)]
        selection: ModelSelection,

        /// Seed for the latent sample
        #[arg(long)]
        seed: Option<u64>,

        /// Where checkpoints live
        #[arg(long, default_value = "checkpoints")]
        checkpoint_dir: PathBuf,

        /// Output image path
        #[arg(short, long, default_value = "generated.png")]
        output: PathBuf,

        /// Nearest-neighbor upscale factor for the output
        #[arg(long, default_value_t = 1)]
        scale: u32,
    },

    /// Sample a class image and reconstruct it (original and
    /// reconstruction side by side)
    Reconstruct {
        #[command(flatten)]
        selection: ModelSelection,

        /// Class to sample (name or index)
        #[arg(long)]
        class: String,

        /// Seed for the class sample
        #[arg(long)]
        seed: Option<u64>,

        /// Directory holding one subdirectory per dataset
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Where checkpoints live
        #[arg(long, default_value = "checkpoints")]
        checkpoint_dir: PathBuf,

        /// Output image path
        #[arg(short, long, default_value = "reconstruction.png")]
        output: PathBuf,

        /// Nearest-neighbor upscale factor for the output
        #[arg(long, default_value_t = 1)]
        scale: u32,
    },

    /// Interpolate in latent space between two sampled class images
    Interpolate {
        #[command(flatten)]
        selection: ModelSelection,

        /// First endpoint class (name or index)
        #[arg(long)]
        first: String,

        /// Second endpoint class (name or index)
        #[arg(long)]
        second: String,

        /// Number of intermediate frames
        #[arg(long, default_value_t = 6)]
        frames: usize,

        /// Interpolation method
        #[arg(long, value_enum, default_value_t = MethodArg::Linear)]
        method: MethodArg,

        /// Seed for the class samples
        #[arg(long)]
        seed: Option<u64>,

        /// Directory holding one subdirectory per dataset
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Where checkpoints live
        #[arg(long, default_value = "checkpoints")]
        checkpoint_dir: PathBuf,

        /// Output image path (one horizontal strip)
        #[arg(short, long, default_value = "interpolation.png")]
        output: PathBuf,

        /// Nearest-neighbor upscale factor for the output
        #[arg(long, default_value_t = 1)]
        scale: u32,
    },

    /// List the class names of a dataset
    Classes {
        /// Dataset (mnist, fmnist, cifar10)
        #[arg(long, default_value = "mnist")]
        dataset: DatasetKind,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            selection,
            epochs,
            batch_size,
            learning_rate,
            alpha,
            loss,
            data_dir,
            synthetic,
            shuffle_seed,
            save,
            checkpoint_dir,
        } => run_train(
            selection,
            epochs,
            batch_size,
            learning_rate,
            alpha,
            loss.kind(),
            &data_dir,
            synthetic,
            shuffle_seed,
            save,
            &checkpoint_dir,
        ),

        Commands::Generate {
            selection,
            seed,
            checkpoint_dir,
            output,
            scale,
        } => run_generate(selection, seed, &checkpoint_dir, &output, scale),

        Commands::Reconstruct {
            selection,
            class,
            seed,
            data_dir,
            checkpoint_dir,
            output,
            scale,
        } => run_reconstruct(
            selection,
            &class,
            seed,
            &data_dir,
            &checkpoint_dir,
            &output,
            scale,
        ),

        Commands::Interpolate {
            selection,
            first,
            second,
            frames,
            method,
            seed,
            data_dir,
            checkpoint_dir,
            output,
            scale,
        } => run_interpolate(
            selection,
            &first,
            &second,
            frames,
            method.method(),
            seed,
            &data_dir,
            &checkpoint_dir,
            &output,
            scale,
        ),

        Commands::Classes { dataset } => {
            for (index, name) in dataset.class_names().iter().enumerate() {
                println!("{index}: {name}");
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_train(
    selection: ModelSelection,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    alpha: f64,
    recon: ReconKind,
    data_dir: &Path,
    synthetic: bool,
    shuffle_seed: Option<u64>,
    save: bool,
    checkpoint_dir: &Path,
) -> Result<()> {
    if !selection.model.supports_encode() {
        bail!(
            "the {} family is decode-only and cannot be trained with the VAE objective",
            selection.model
        );
    }

    let dims = selection.dataset.dims();
    let config = TrainConfig::new(epochs)
        .with_learning_rate(learning_rate)
        .with_alpha(alpha)
        .with_recon(recon);

    let save_stem = save.then(|| {
        checkpoint_path(
            checkpoint_dir,
            selection.model,
            selection.dataset,
            selection.latent,
        )
    });
    if save {
        std::fs::create_dir_all(checkpoint_dir)
            .with_context(|| format!("failed to create {}", checkpoint_dir.display()))?;
    }

    println!(
        "training {} on {} (latent {}, {} loss, {} epochs)",
        selection.model,
        if synthetic {
            "synthetic noise".to_string()
        } else {
            selection.dataset.to_string()
        },
        selection.latent,
        recon.name(),
        epochs
    );

    if synthetic {
        let source = SyntheticBatches::new(dims, batch_size, 16);
        fit(&selection, &source, &config, save_stem.as_deref())
    } else {
        let dir = data_dir.join(selection.dataset.name());
        let dataset = InMemoryDataset::from_dir(selection.dataset, &dir)
            .with_context(|| format!("failed to load {} from {}", selection.dataset, dir.display()))?;
        println!("loaded {} images", dataset.len());

        match shuffle_seed {
            Some(seed) => {
                let source = MiniBatches::shuffled(&dataset, batch_size, seed);
                fit(&selection, &source, &config, save_stem.as_deref())
            }
            None => {
                let source = MiniBatches::new(&dataset, batch_size);
                fit(&selection, &source, &config, save_stem.as_deref())
            }
        }
    }
}

/// Dispatches to the concrete model family and drives one training run
fn fit(
    selection: &ModelSelection,
    source: &dyn BatchSource<TrainBackend>,
    config: &TrainConfig,
    save_stem: Option<&Path>,
) -> Result<()> {
    let device = default_device();
    let dims = selection.dataset.dims();

    match selection.model {
        ModelKind::DenseVae => {
            let model = DenseVae::<TrainBackend>::new(
                &DenseVaeConfig::new(dims, selection.latent),
                &device,
            );
            fit_model(model, source, config, save_stem)
        }
        ModelKind::ConvVae => {
            let model =
                ConvVae::<TrainBackend>::new(&ConvVaeConfig::new(dims, selection.latent), &device);
            fit_model(model, source, config, save_stem)
        }
        ModelKind::Dcgan => unreachable!("rejected before dispatch"),
    }
}

fn fit_model<M>(
    model: M,
    source: &dyn BatchSource<TrainBackend>,
    config: &TrainConfig,
    save_stem: Option<&Path>,
) -> Result<()>
where
    M: burn::module::AutodiffModule<TrainBackend> + LatentCodec<TrainBackend>,
{
    let device = default_device();

    let pb = ProgressBar::new(config.epochs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] epoch {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let trained = train_with(model, source, &device, config, |_, loss| {
        pb.inc(1);
        pb.set_message(format!("loss {loss:.2}"));
    })?;
    pb.finish_and_clear();

    println!(
        "final loss: {:.4}",
        trained.report.final_loss().unwrap_or(f32::NAN)
    );

    if let Some(stem) = save_stem {
        trained
            .save(stem)
            .with_context(|| format!("failed to save checkpoint to {}", stem.display()))?;
        println!("saved checkpoint to {}", stem.with_extension("bin").display());
    }

    Ok(())
}

fn run_generate(
    selection: ModelSelection,
    seed: Option<u64>,
    checkpoint_dir: &Path,
    output: &Path,
    scale: u32,
) -> Result<()> {
    if let Some(seed) = seed {
        InferBackend::seed(seed);
    }

    let explorer = build_explorer(&selection, checkpoint_dir, None)?;
    let image = explorer.generate(selection.spec())?;
    save_image(image, scale, output)?;

    println!("saved generated image to {}", output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_reconstruct(
    selection: ModelSelection,
    class: &str,
    seed: Option<u64>,
    data_dir: &Path,
    checkpoint_dir: &Path,
    output: &Path,
    scale: u32,
) -> Result<()> {
    let class = resolve_class(selection.dataset, class)?;
    let explorer = build_explorer(&selection, checkpoint_dir, Some(data_dir))?;

    let mut rng = seeded_rng(seed);
    let original = explorer.sample_image(selection.dataset, class, &mut rng)?;
    let recon = explorer.reconstruct(selection.spec(), original.clone())?;

    // Original on the left, reconstruction on the right.
    save_image(hstack(vec![original, recon]), scale, output)?;

    println!(
        "saved original + reconstruction of class {:?} to {}",
        selection.dataset.class_names()[class],
        output.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_interpolate(
    selection: ModelSelection,
    first: &str,
    second: &str,
    frames: usize,
    method: InterpolationMethod,
    seed: Option<u64>,
    data_dir: &Path,
    checkpoint_dir: &Path,
    output: &Path,
    scale: u32,
) -> Result<()> {
    let first = resolve_class(selection.dataset, first)?;
    let second = resolve_class(selection.dataset, second)?;
    let explorer = build_explorer(&selection, checkpoint_dir, Some(data_dir))?;

    let mut rng = seeded_rng(seed);
    let start = explorer.sample_image(selection.dataset, first, &mut rng)?;
    let end = explorer.sample_image(selection.dataset, second, &mut rng)?;

    let config = InterpolationConfig::new(frames).with_method(method);
    let strip = explorer.interpolate(selection.spec(), start, end, &config)?;
    save_image(hstack(strip), scale, output)?;

    println!(
        "saved {}-frame interpolation strip to {}",
        config.output_frames(),
        output.display()
    );
    Ok(())
}

/// Builds the explorer this invocation needs: one model, and the dataset
/// when class sampling is involved
fn build_explorer(
    selection: &ModelSelection,
    checkpoint_dir: &Path,
    data_dir: Option<&Path>,
) -> Result<Explorer<InferBackend>> {
    let mut explorer = Explorer::new(default_device());

    let spec = selection.spec();
    explorer.load_model(spec, checkpoint_dir).with_context(|| {
        format!(
            "no trained weights for {} on {} with latent {} (run `vae-lab train --save` first)",
            spec.kind, spec.dataset, spec.latent
        )
    })?;

    if let Some(data_dir) = data_dir {
        let dir = data_dir.join(selection.dataset.name());
        explorer
            .load_dataset(selection.dataset, &dir)
            .with_context(|| {
                format!("failed to load {} from {}", selection.dataset, dir.display())
            })?;
    }

    Ok(explorer)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Accepts a class by name (case-insensitive) or numeric index
fn resolve_class(dataset: DatasetKind, raw: &str) -> Result<usize> {
    let names = dataset.class_names();
    if let Some(index) = names.iter().position(|name| name.eq_ignore_ascii_case(raw)) {
        return Ok(index);
    }
    if let Ok(index) = raw.parse::<usize>() {
        if index < names.len() {
            return Ok(index);
        }
    }
    bail!("unknown class {raw:?} for {dataset}; see `vae-lab classes --dataset {dataset}`")
}

fn save_image(image: Tensor<InferBackend, 3>, scale: u32, output: &Path) -> Result<()> {
    let [_, h, w] = image.dims();
    let rgb = tensor_to_rgb8(image);

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(w as u32, h as u32, rgb)
        .context("failed to create image buffer")?;
    let img = if scale > 1 {
        imageops::resize(
            &img,
            w as u32 * scale,
            h as u32 * scale,
            imageops::FilterType::Nearest,
        )
    } else {
        img
    };

    img.save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_class_by_name_and_index() {
        assert_eq!(resolve_class(DatasetKind::Mnist, "3").unwrap(), 3);
        assert_eq!(
            resolve_class(DatasetKind::FashionMnist, "ankle boot").unwrap(),
            9
        );
        assert_eq!(resolve_class(DatasetKind::Cifar10, "cat").unwrap(), 3);
        assert!(resolve_class(DatasetKind::Cifar10, "submarine").is_err());
        assert!(resolve_class(DatasetKind::Mnist, "10").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
