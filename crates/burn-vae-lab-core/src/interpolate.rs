//! Latent-space interpolation between two codes
//!
//! Walks from one latent vector to another and returns every step, so the
//! decoded frames can be laid out as a strip.
//!
//! # Methods
//!
//! - **Linear**: weighted average `(1-t) * a + t * b`
//! - **Slerp**: spherical interpolation along the geodesic (falls back to
//!   lerp when the endpoints are nearly parallel)
//! - **Cosine**: linear blend with a cosine-eased `t`

use burn::prelude::*;
use burn::tensor::ElementConversion;

/// Interpolation methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMethod {
    /// Linear blend: (1-t) * a + t * b
    #[default]
    Linear,
    /// Spherical linear interpolation
    Slerp,
    /// Cosine-eased blend (smoother at the endpoints)
    Cosine,
}

/// Interpolation configuration
#[derive(Debug, Clone)]
pub struct InterpolationConfig {
    /// Number of intermediate steps between the endpoints
    pub num_intermediate: usize,
    /// Interpolation method
    pub method: InterpolationMethod,
    /// Whether the endpoints themselves are part of the output
    pub include_endpoints: bool,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            num_intermediate: 6,
            method: InterpolationMethod::Linear,
            include_endpoints: true,
        }
    }
}

impl InterpolationConfig {
    pub fn new(num_intermediate: usize) -> Self {
        Self {
            num_intermediate,
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: InterpolationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_endpoints(mut self, include: bool) -> Self {
        self.include_endpoints = include;
        self
    }

    /// Total output frames for one endpoint pair
    pub fn output_frames(&self) -> usize {
        if self.include_endpoints {
            self.num_intermediate + 2
        } else {
            self.num_intermediate
        }
    }

    /// The `t` values this configuration walks through
    pub fn t_values(&self) -> Vec<f32> {
        if self.include_endpoints {
            let total = self.num_intermediate + 2;
            (0..total).map(|i| i as f32 / (total - 1) as f32).collect()
        } else {
            (1..=self.num_intermediate)
                .map(|i| i as f32 / (self.num_intermediate + 1) as f32)
                .collect()
        }
    }
}

/// Linear interpolation between two tensors
///
/// `t` should be in [0, 1] where t=0 returns `a` and t=1 returns `b`
pub fn lerp<B: Backend, const D: usize>(
    a: Tensor<B, D>,
    b: Tensor<B, D>,
    t: f32,
) -> Tensor<B, D> {
    a.clone() * (1.0 - t) + b * t
}

/// Spherical linear interpolation
///
/// Maintains constant angular speed along the geodesic. Intended for a
/// single latent code per call (the angle is computed over the whole
/// tensor). Nearly parallel endpoints fall back to [`lerp`].
pub fn slerp<B: Backend, const D: usize>(
    a: Tensor<B, D>,
    b: Tensor<B, D>,
    t: f32,
) -> Tensor<B, D> {
    let a_norm = normalize(a.clone());
    let b_norm = normalize(b.clone());

    let dot: f32 = (a_norm * b_norm).sum().into_scalar().elem();
    let dot = dot.clamp(-1.0, 1.0);

    if dot.abs() > 0.9995 {
        return lerp(a, b, t);
    }

    let omega = dot.acos();
    let sin_omega = omega.sin();
    let s0 = ((1.0 - t) * omega).sin() / sin_omega;
    let s1 = (t * omega).sin() / sin_omega;

    a * s0 + b * s1
}

/// Cosine interpolation: lerp with `t` eased by `(1 - cos(t * pi)) / 2`
pub fn cosine_interp<B: Backend, const D: usize>(
    a: Tensor<B, D>,
    b: Tensor<B, D>,
    t: f32,
) -> Tensor<B, D> {
    let t_smooth = (1.0 - (t * std::f32::consts::PI).cos()) * 0.5;
    lerp(a, b, t_smooth)
}

/// Interpolates between two latent codes `[1, latent]`
///
/// Returns one latent batch per `t` value of the configuration.
pub fn interpolate_latents<B: Backend>(
    a: Tensor<B, 2>,
    b: Tensor<B, 2>,
    config: &InterpolationConfig,
) -> Vec<Tensor<B, 2>> {
    config
        .t_values()
        .into_iter()
        .map(|t| match config.method {
            InterpolationMethod::Linear => lerp(a.clone(), b.clone(), t),
            InterpolationMethod::Slerp => slerp(a.clone(), b.clone(), t),
            InterpolationMethod::Cosine => cosine_interp(a.clone(), b.clone(), t),
        })
        .collect()
}

fn normalize<B: Backend, const D: usize>(t: Tensor<B, D>) -> Tensor<B, D> {
    let norm = t.clone().powf_scalar(2.0).sum().sqrt() + 1e-12;
    t / norm.unsqueeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn to_vec(t: Tensor<B, 2>) -> Vec<f32> {
        t.into_data().convert::<f32>().to_vec().unwrap()
    }

    #[test]
    fn test_endpoints_are_included() {
        let device = Default::default();
        let a = Tensor::<B, 2>::from_floats([[0.0, 0.0]], &device);
        let b = Tensor::<B, 2>::from_floats([[1.0, 2.0]], &device);
        let config = InterpolationConfig::new(3);

        let frames = interpolate_latents(a, b, &config);
        assert_eq!(frames.len(), 5);
        assert_eq!(to_vec(frames[0].clone()), vec![0.0, 0.0]);
        assert_eq!(to_vec(frames[4].clone()), vec![1.0, 2.0]);
    }

    #[test]
    fn test_lerp_midpoint() {
        let device = Default::default();
        let a = Tensor::<B, 2>::from_floats([[0.0, 2.0]], &device);
        let b = Tensor::<B, 2>::from_floats([[1.0, 4.0]], &device);
        let mid = to_vec(lerp(a, b, 0.5));
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert!((mid[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_without_endpoints() {
        let config = InterpolationConfig::new(3).with_endpoints(false);
        let ts = config.t_values();
        assert_eq!(ts.len(), 3);
        assert!(ts[0] > 0.0 && ts[2] < 1.0);
        assert_eq!(config.output_frames(), 3);
    }

    #[test]
    fn test_slerp_parallel_falls_back_to_lerp() {
        let device = Default::default();
        let a = Tensor::<B, 2>::from_floats([[1.0, 0.0]], &device);
        let b = Tensor::<B, 2>::from_floats([[2.0, 0.0]], &device);
        let s = to_vec(slerp(a.clone(), b.clone(), 0.5));
        let l = to_vec(lerp(a, b, 0.5));
        assert_eq!(s, l);
    }

    #[test]
    fn test_slerp_stays_on_arc() {
        let device = Default::default();
        let a = Tensor::<B, 2>::from_floats([[1.0, 0.0]], &device);
        let b = Tensor::<B, 2>::from_floats([[0.0, 1.0]], &device);
        let mid = to_vec(slerp(a, b, 0.5));
        let norm = (mid[0] * mid[0] + mid[1] * mid[1]).sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "midpoint norm was {}", norm);
    }

    #[test]
    fn test_cosine_hits_endpoints() {
        let device = Default::default();
        let a = Tensor::<B, 2>::from_floats([[0.5, 0.5]], &device);
        let b = Tensor::<B, 2>::from_floats([[1.5, -0.5]], &device);
        let start = to_vec(cosine_interp(a.clone(), b.clone(), 0.0));
        let end = to_vec(cosine_interp(a, b, 1.0));
        assert!((start[0] - 0.5).abs() < 1e-6);
        assert!((end[0] - 1.5).abs() < 1e-6);
    }
}
