//! CIFAR-10 binary format
//!
//! Each of `data_batch_1.bin` .. `data_batch_5.bin` holds fixed-size
//! records: one label byte followed by 3072 pixel bytes (3 channels x
//! 32 x 32, channel-planar - the layout the rest of the workspace already
//! uses). Pixel bytes are converted to `f32` in `[0, 1]`.

use std::fs;
use std::path::Path;

use crate::DataError;

/// Bytes per record: 1 label + 3 * 32 * 32 pixels
pub const RECORD_LEN: usize = 3073;
/// Number of training batch files
pub const TRAIN_BATCHES: usize = 5;

const NUM_CLASSES: u8 = 10;

/// Loads the five training batch files from `dir`
pub fn load_train(dir: &Path) -> Result<(Vec<f32>, Vec<u8>), DataError> {
    let mut pixels = Vec::new();
    let mut labels = Vec::new();

    for batch in 1..=TRAIN_BATCHES {
        let path = dir.join(format!("data_batch_{batch}.bin"));
        load_file(&path, &mut pixels, &mut labels)?;
    }

    Ok((pixels, labels))
}

fn load_file(path: &Path, pixels: &mut Vec<f32>, labels: &mut Vec<u8>) -> Result<(), DataError> {
    let bytes = fs::read(path)?;
    let name = path.display().to_string();

    if bytes.is_empty() || bytes.len() % RECORD_LEN != 0 {
        return Err(DataError::Truncated {
            path: name,
            expected: bytes.len().div_ceil(RECORD_LEN).max(1) * RECORD_LEN,
            actual: bytes.len(),
        });
    }

    for record in bytes.chunks_exact(RECORD_LEN) {
        let label = record[0];
        if label >= NUM_CLASSES {
            return Err(DataError::LabelOutOfRange {
                label,
                classes: NUM_CLASSES as usize,
            });
        }
        labels.push(label);
        pixels.extend(record[1..].iter().map(|&b| b as f32 / 255.0));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_batches(dir: &Path, records_per_batch: usize) {
        for batch in 1..=TRAIN_BATCHES {
            let path = dir.join(format!("data_batch_{batch}.bin"));
            let mut file = fs::File::create(path).unwrap();
            for record in 0..records_per_batch {
                let mut buf = vec![((batch + record) % 10) as u8];
                buf.extend(std::iter::repeat(128u8).take(RECORD_LEN - 1));
                file.write_all(&buf).unwrap();
            }
        }
    }

    #[test]
    fn test_load_train_concatenates_batches() {
        let dir = tempfile::tempdir().unwrap();
        write_batches(dir.path(), 2);

        let (pixels, labels) = load_train(dir.path()).unwrap();
        assert_eq!(labels.len(), 10);
        assert_eq!(pixels.len(), 10 * 3072);
        assert!((pixels[0] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_batches(dir.path(), 1);

        // Corrupt the last batch with a trailing partial record.
        let path = dir.path().join("data_batch_5.bin");
        let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(&[1, 2, 3]).unwrap();

        let err = load_train(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::Truncated { .. }));
    }

    #[test]
    fn test_label_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_batches(dir.path(), 1);

        let path = dir.path().join("data_batch_1.bin");
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] = 11;
        fs::write(&path, bytes).unwrap();

        let err = load_train(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::LabelOutOfRange { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_train(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
