//! Weight matrix persistence
//!
//! A trained one-vs-all model is fully described by its (D+1)×K weight
//! matrix; it is written as one JSON document and read back unchanged.

use crate::core::{ClassifierError, Result};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write `weights` to `path`, replacing any existing file
pub fn save_weights<P: AsRef<Path>>(path: P, weights: &Array2<f64>) -> Result<()> {
    let file = File::create(path).map_err(ClassifierError::IoError)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, weights)
        .map_err(|e| ClassifierError::SerializationError(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Read a weight matrix written by [`save_weights`]
pub fn load_weights<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let file = File::open(path).map_err(ClassifierError::IoError)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| ClassifierError::SerializationError(e.to_string()))
}
