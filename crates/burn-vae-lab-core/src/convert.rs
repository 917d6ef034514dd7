//! Tensor to 8-bit image buffer conversion
//!
//! The pipeline works on `[c, h, w]` float tensors with values in `[0, 1]`;
//! these helpers turn them into interleaved RGB bytes for PNG output and
//! compose interpolation frames into a single horizontal strip.

use burn::prelude::*;

/// Converts a single `[c, h, w]` image tensor (values in `[0, 1]`) to
/// interleaved RGB8 bytes
///
/// Grayscale input (`c == 1`) is replicated across the three output
/// channels. Values outside `[0, 1]` are clamped.
pub fn tensor_to_rgb8<B: Backend>(image: Tensor<B, 3>) -> Vec<u8> {
    let [c, h, w] = image.dims();

    let scaled = (image * 255.0).clamp(0.0, 255.0);
    let data = scaled.into_data();
    let floats: Vec<f32> = data.convert::<f32>().to_vec().unwrap();

    let mut rgb = Vec::with_capacity(h * w * 3);
    for y in 0..h {
        for x in 0..w {
            for channel in 0..3 {
                let src = if c == 1 { 0 } else { channel };
                rgb.push(floats[src * h * w + y * w + x] as u8);
            }
        }
    }

    rgb
}

/// Lays out frames left to right into one `[c, h, w * n]` strip
///
/// All frames must share channel count and height.
pub fn hstack<B: Backend>(frames: Vec<Tensor<B, 3>>) -> Tensor<B, 3> {
    Tensor::cat(frames, 2)
}
