//! Latent Model Families
//!
//! Every model family implements one capability interface,
//! [`LatentCodec`]: encode an image batch to latent distribution
//! parameters and decode latent codes back to images. Families are
//! dispatched explicitly through [`ModelKind`] and the [`AnyModel`] enum;
//! there is no reflective lookup.
//!
//! # Families
//!
//! - [`DenseVae`] - fully connected encoder/decoder
//! - [`ConvVae`] - strided-conv encoder, transposed-conv decoder
//! - [`DcganGenerator`] - decode-only generator (encode is a typed error)
//!
//! All decoders end in a sigmoid, so reconstructed pixels are Bernoulli
//! probabilities in `[0, 1]` - the convention the loss module assumes.

pub mod codec;
pub mod conv;
pub mod dense;
pub mod gan;
pub mod registry;

pub use codec::{reparameterize, LatentCodec, ModelError, VaeOutput};
pub use conv::{ConvVae, ConvVaeConfig};
pub use dense::{DenseVae, DenseVaeConfig};
pub use gan::{DcganGenerator, DcganGeneratorConfig};
pub use registry::{build_model, AnyModel, ModelKind};
