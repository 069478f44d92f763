//! IDX format loader
//!
//! Reads the MNIST distribution files:
//! - image files: magic `0x00000803`, count, rows, cols, then `count*rows*cols` bytes
//! - label files: magic `0x00000801`, count, then `count` bytes
//!
//! All header integers are big-endian.

use crate::core::{ClassifierError, Result};
use crate::data::{group_rows_by_class, DigitDataset};
use log::info;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGE_MAGIC: u32 = 0x0000_0803;
const LABEL_MAGIC: u32 = 0x0000_0801;

/// Load the four MNIST IDX files from `dir` into a class-keyed dataset
pub fn load_idx_dir<P: AsRef<Path>>(dir: P) -> Result<DigitDataset> {
    let dir = dir.as_ref();
    info!("Loading IDX dataset from {dir:?}");

    let train = load_idx_pair(dir.join(TRAIN_IMAGES), dir.join(TRAIN_LABELS))?;
    let test = load_idx_pair(dir.join(TEST_IMAGES), dir.join(TEST_LABELS))?;

    let dataset = DigitDataset::from_blocks(train, test);
    info!(
        "Loaded {} training and {} test images",
        dataset.n_train(),
        dataset.n_test()
    );
    Ok(dataset)
}

/// Load one image file and its label file, grouped by label
pub fn load_idx_pair<P: AsRef<Path>, Q: AsRef<Path>>(
    images_path: P,
    labels_path: Q,
) -> Result<BTreeMap<usize, Array2<f64>>> {
    let images = read_images(BufReader::new(File::open(images_path)?))?;
    let labels = read_labels(BufReader::new(File::open(labels_path)?))?;

    if images.nrows() != labels.len() {
        return Err(ClassifierError::DimensionMismatch {
            expected: images.nrows(),
            actual: labels.len(),
        });
    }

    let n_features = images.ncols();
    let rows = images
        .outer_iter()
        .zip(labels)
        .map(|(row, label)| (usize::from(label), row.to_vec()));
    group_rows_by_class(rows, n_features)
}

/// Read an IDX image file into an N×(rows·cols) matrix of raw intensities
pub fn read_images<R: Read>(mut reader: R) -> Result<Array2<f64>> {
    expect_magic(&mut reader, IMAGE_MAGIC)?;
    let count = read_u32_be(&mut reader)? as usize;
    let rows = read_u32_be(&mut reader)? as usize;
    let cols = read_u32_be(&mut reader)? as usize;
    let n_features = rows
        .checked_mul(cols)
        .ok_or_else(|| ClassifierError::ParseError(format!("Image size {rows}x{cols} overflows")))?;
    let len = count.checked_mul(n_features).ok_or_else(|| {
        ClassifierError::ParseError(format!("{count} images of {n_features} pixels overflow"))
    })?;

    let pixels = read_payload(&mut reader, len, "image")?;

    Array2::from_shape_vec(
        (count, n_features),
        pixels.into_iter().map(f64::from).collect(),
    )
    .map_err(|e| ClassifierError::InvalidDataset(e.to_string()))
}

/// Read an IDX label file
pub fn read_labels<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    expect_magic(&mut reader, LABEL_MAGIC)?;
    let count = read_u32_be(&mut reader)? as usize;

    read_payload(&mut reader, count, "label")
}

/// Read exactly `len` bytes, growing the buffer only as data arrives
///
/// Header counts are untrusted, so nothing is allocated up front.
fn read_payload<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    reader.take(len as u64).read_to_end(&mut payload)?;
    if payload.len() != len {
        return Err(ClassifierError::ParseError(format!(
            "Truncated {what} data: header promises {len} bytes, found {}",
            payload.len()
        )));
    }
    Ok(payload)
}

fn expect_magic<R: Read>(reader: &mut R, expected: u32) -> Result<()> {
    let magic = read_u32_be(reader)?;
    if magic != expected {
        return Err(ClassifierError::ParseError(format!(
            "Bad IDX magic number: expected {expected:#010x}, got {magic:#010x}"
        )));
    }
    Ok(())
}

fn read_u32_be<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| ClassifierError::ParseError(format!("Truncated IDX header: {e}")))?;
    Ok(u32::from_be_bytes(buf))
}

/// Serialize images in IDX layout; used to build fixtures
pub fn encode_images(images: &[Vec<u8>], rows: usize, cols: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + images.len() * rows * cols);
    out.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
    out.extend_from_slice(&(images.len() as u32).to_be_bytes());
    out.extend_from_slice(&(rows as u32).to_be_bytes());
    out.extend_from_slice(&(cols as u32).to_be_bytes());
    for image in images {
        out.extend_from_slice(image);
    }
    out
}

/// Serialize labels in IDX layout; used to build fixtures
pub fn encode_labels(labels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + labels.len());
    out.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(labels);
    out
}
