//! End-to-end checks: train on a synthetic source, persist, reload into
//! the explorer, and run every exploration operation.

use burn::backend::Autodiff;
use burn_ndarray::NdArray;
use rand::SeedableRng;

use burn_vae_lab::checkpoint::checkpoint_path;
use burn_vae_lab::core::interpolate::InterpolationConfig;
use burn_vae_lab::core::loss::ReconKind;
use burn_vae_lab::core::ImageDims;
use burn_vae_lab::data::{DatasetKind, InMemoryDataset, MiniBatches, SyntheticBatches};
use burn_vae_lab::models::{DenseVae, DenseVaeConfig, ModelKind};
use burn_vae_lab::train::{train, TrainConfig};
use burn_vae_lab::{Explorer, ModelSpec};

type Inner = NdArray<f32>;
type B = Autodiff<Inner>;

const LATENT: usize = 4;

fn mnist_like_dataset() -> InMemoryDataset {
    // Sixteen flat-gray 28x28 images, two classes.
    let dims = DatasetKind::Mnist.dims();
    let pixels: Vec<f32> = (0..16)
        .flat_map(|i| std::iter::repeat(0.2 + 0.04 * (i % 8) as f32).take(dims.len()))
        .collect();
    let labels: Vec<u8> = (0..16).map(|i| (i % 2) as u8).collect();
    InMemoryDataset::new(dims, pixels, labels).unwrap()
}

#[test]
fn one_epoch_completes_for_both_loss_variants() {
    let device = Default::default();
    let dims = ImageDims::new(1, 28, 28);
    let source = SyntheticBatches::new(dims, 16, 4);

    for recon in [ReconKind::BinaryCrossEntropy, ReconKind::MeanSquaredError] {
        let model = DenseVae::<B>::new(&DenseVaeConfig::new(dims, LATENT).with_hidden(32), &device);
        let config = TrainConfig::new(1).with_recon(recon).with_alpha(100.0);

        let trained = train(model, &source, &device, &config)
            .unwrap_or_else(|e| panic!("{} training failed: {e}", recon.name()));
        let loss = trained.report.final_loss().unwrap();
        assert!(
            loss.is_finite() && loss >= 0.0,
            "{} loss was {loss}",
            recon.name()
        );
    }
}

#[test]
fn trained_weights_round_trip_through_the_explorer() {
    let device = Default::default();
    let dataset = mnist_like_dataset();
    let batches = MiniBatches::shuffled(&dataset, 8, 11);

    let checkpoints = tempfile::tempdir().unwrap();
    let spec = ModelSpec::new(ModelKind::DenseVae, DatasetKind::Mnist, LATENT);
    let stem = checkpoint_path(checkpoints.path(), spec.kind, spec.dataset, spec.latent);

    // Train and persist via the save flag.
    let model = DenseVae::<B>::new(
        &DenseVaeConfig::new(dataset.dims(), LATENT).with_hidden(32),
        &device,
    );
    let config = TrainConfig::new(2)
        .with_learning_rate(1e-3)
        .with_checkpoint(&stem);
    let trained = train(model, &batches, &device, &config).unwrap();
    assert_eq!(trained.report.epoch_losses.len(), 2);
    assert!(stem.with_extension("bin").exists());

    // Reload on the inference backend and run every operation.
    let mut explorer = Explorer::<Inner>::new(Default::default());
    explorer.load_model(spec, checkpoints.path()).unwrap();
    explorer.register_dataset(DatasetKind::Mnist, dataset);

    let generated = explorer.generate(spec).unwrap();
    assert_eq!(generated.dims(), [1, 28, 28]);

    let mut rng = rand::rngs::StdRng::seed_from_u64(9);
    let original = explorer
        .sample_image(DatasetKind::Mnist, 0, &mut rng)
        .unwrap();
    let recon = explorer.reconstruct(spec, original.clone()).unwrap();
    assert_eq!(recon.dims(), original.dims());

    let second = explorer
        .sample_image(DatasetKind::Mnist, 1, &mut rng)
        .unwrap();
    let frames = explorer
        .interpolate(spec, original, second, &InterpolationConfig::new(3))
        .unwrap();
    assert_eq!(frames.len(), 5);
}

#[test]
fn missing_checkpoint_is_a_typed_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut explorer = Explorer::<Inner>::new(Default::default());
    let spec = ModelSpec::new(ModelKind::ConvVae, DatasetKind::Cifar10, 64);

    let err = explorer.load_model(spec, dir.path()).unwrap_err();
    assert!(err.to_string().contains("checkpoint not found"));
}
