//! IDX ubyte parsing (MNIST / Fashion-MNIST)
//!
//! Header layout (big-endian u32s): magic, item count, then one dimension
//! per remaining axis. Image files carry magic `0x0803` with rows/cols;
//! label files carry magic `0x0801`. Pixel bytes are converted to `f32`
//! in `[0, 1]`.

use std::fs;
use std::path::Path;

use burn_vae_lab_core::ImageDims;

use crate::DataError;

/// Magic number of an IDX image file (u8 data, 3 dimensions)
pub const IMAGE_MAGIC: u32 = 0x0000_0803;
/// Magic number of an IDX label file (u8 data, 1 dimension)
pub const LABEL_MAGIC: u32 = 0x0000_0801;

/// Loads an image/label file pair and validates the shapes agree with
/// `dims` and each other
pub fn load_pair(
    images_path: &Path,
    labels_path: &Path,
    dims: ImageDims,
) -> Result<(Vec<f32>, Vec<u8>), DataError> {
    let (pixels, count) = load_images(images_path, dims)?;
    let labels = load_labels(labels_path)?;

    if count != labels.len() {
        return Err(DataError::CountMismatch {
            images: count,
            labels: labels.len(),
        });
    }

    Ok((pixels, labels))
}

fn load_images(path: &Path, dims: ImageDims) -> Result<(Vec<f32>, usize), DataError> {
    let bytes = fs::read(path)?;
    let name = path.display().to_string();

    let magic = read_u32_be(&bytes, 0, &name)?;
    if magic != IMAGE_MAGIC {
        return Err(DataError::BadMagic {
            path: name,
            expected: IMAGE_MAGIC,
            found: magic,
        });
    }

    let count = read_u32_be(&bytes, 4, &name)? as usize;
    let rows = read_u32_be(&bytes, 8, &name)? as usize;
    let cols = read_u32_be(&bytes, 12, &name)? as usize;
    if rows != dims.height || cols != dims.width {
        return Err(DataError::BadShape {
            path: name,
            expected: vec![dims.height, dims.width],
            found: vec![rows, cols],
        });
    }

    let expected = 16 + count * rows * cols;
    if bytes.len() < expected {
        return Err(DataError::Truncated {
            path: name,
            expected,
            actual: bytes.len(),
        });
    }

    let pixels = bytes[16..expected]
        .iter()
        .map(|&b| b as f32 / 255.0)
        .collect();
    Ok((pixels, count))
}

fn load_labels(path: &Path) -> Result<Vec<u8>, DataError> {
    let bytes = fs::read(path)?;
    let name = path.display().to_string();

    let magic = read_u32_be(&bytes, 0, &name)?;
    if magic != LABEL_MAGIC {
        return Err(DataError::BadMagic {
            path: name,
            expected: LABEL_MAGIC,
            found: magic,
        });
    }

    let count = read_u32_be(&bytes, 4, &name)? as usize;
    let expected = 8 + count;
    if bytes.len() < expected {
        return Err(DataError::Truncated {
            path: name,
            expected,
            actual: bytes.len(),
        });
    }

    Ok(bytes[8..expected].to_vec())
}

fn read_u32_be(bytes: &[u8], offset: usize, path: &str) -> Result<u32, DataError> {
    let end = offset + 4;
    if bytes.len() < end {
        return Err(DataError::Truncated {
            path: path.to_string(),
            expected: end,
            actual: bytes.len(),
        });
    }
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..end]);
    Ok(u32::from_be_bytes(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_idx_images(path: &Path, count: u32, rows: u32, cols: u32, payload: &[u8]) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(&IMAGE_MAGIC.to_be_bytes()).unwrap();
        file.write_all(&count.to_be_bytes()).unwrap();
        file.write_all(&rows.to_be_bytes()).unwrap();
        file.write_all(&cols.to_be_bytes()).unwrap();
        file.write_all(payload).unwrap();
    }

    fn write_idx_labels(path: &Path, labels: &[u8]) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(&LABEL_MAGIC.to_be_bytes()).unwrap();
        file.write_all(&(labels.len() as u32).to_be_bytes()).unwrap();
        file.write_all(labels).unwrap();
    }

    #[test]
    fn test_load_pair_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");

        write_idx_images(&images, 2, 2, 2, &[0, 51, 102, 153, 204, 255, 0, 51]);
        write_idx_labels(&labels, &[3, 7]);

        let dims = ImageDims::new(1, 2, 2);
        let (pixels, labels) = load_pair(&images, &labels, dims).unwrap();
        assert_eq!(labels, vec![3, 7]);
        assert_eq!(pixels.len(), 8);
        assert!((pixels[1] - 0.2).abs() < 1e-6);
        assert!((pixels[5] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");

        // Labels written where images are expected.
        write_idx_labels(&images, &[0, 0]);
        write_idx_labels(&labels, &[0, 0]);

        let err = load_pair(&images, &labels, ImageDims::new(1, 2, 2)).unwrap_err();
        assert!(matches!(err, DataError::BadMagic { .. }));
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");

        // Claims 2 images but carries one.
        write_idx_images(&images, 2, 2, 2, &[0; 4]);
        write_idx_labels(&labels, &[0, 1]);

        let err = load_pair(&images, &labels, ImageDims::new(1, 2, 2)).unwrap_err();
        assert!(matches!(err, DataError::Truncated { .. }));
    }

    #[test]
    fn test_shape_disagreement_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");

        write_idx_images(&images, 1, 4, 4, &[0; 16]);
        write_idx_labels(&labels, &[0]);

        let err = load_pair(&images, &labels, ImageDims::new(1, 2, 2)).unwrap_err();
        assert!(matches!(err, DataError::BadShape { .. }));
    }

    #[test]
    fn test_count_disagreement_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");

        write_idx_images(&images, 2, 2, 2, &[0; 8]);
        write_idx_labels(&labels, &[0]);

        let err = load_pair(&images, &labels, ImageDims::new(1, 2, 2)).unwrap_err();
        assert!(matches!(err, DataError::CountMismatch { .. }));
    }
}
