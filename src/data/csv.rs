//! CSV format loader
//!
//! Supports the common `mnist_train.csv` / `mnist_test.csv` layout where:
//! - The first column is the digit label
//! - All other columns are pixel intensities
//! - First row can be headers (automatically detected)

use crate::core::{ClassifierError, Result};
use crate::data::{group_rows_by_class, DigitDataset};
use log::info;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Labeled rows read from one CSV file
#[derive(Debug, Clone)]
pub struct CSVDigits {
    rows: Vec<(usize, Vec<f64>)>,
    dimensions: usize,
}

impl CSVDigits {
    /// Load rows from a CSV file
    ///
    /// The first column is assumed to be the label.
    /// Headers are automatically detected if present.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(ClassifierError::IoError)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load rows from a reader with header auto-detection
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, true)
    }

    /// Load rows from a reader with explicit header option
    pub fn from_reader_with_options<R: BufRead>(reader: R, auto_detect_header: bool) -> Result<Self> {
        let mut rows = Vec::new();
        let mut dimensions = None;
        let mut first_data_line = true;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(ClassifierError::IoError)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if first_data_line {
                first_data_line = false;
                if auto_detect_header && Self::is_header_line(line) {
                    continue;
                }
            }

            let (label, pixels) = Self::parse_data_line(line).map_err(|e| {
                ClassifierError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;

            match dimensions {
                None => dimensions = Some(pixels.len()),
                Some(d) if d != pixels.len() => {
                    return Err(ClassifierError::DimensionMismatch {
                        expected: d,
                        actual: pixels.len(),
                    })
                }
                Some(_) => {}
            }
            rows.push((label, pixels));
        }

        let dimensions = dimensions.ok_or(ClassifierError::EmptyDataset)?;
        Ok(CSVDigits { rows, dimensions })
    }

    /// Check if a line appears to be a header
    fn is_header_line(line: &str) -> bool {
        let fields: Vec<&str> = line.split(',').collect();

        if fields.len() < 2 {
            return false;
        }

        let non_numeric_count = fields
            .iter()
            .filter(|field| field.trim().parse::<f64>().is_err())
            .count();

        non_numeric_count > fields.len() / 2
    }

    /// Parse a CSV data line into a label and its pixel values
    fn parse_data_line(line: &str) -> std::result::Result<(usize, Vec<f64>), String> {
        let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();

        if fields.len() < 2 {
            return Err(format!("Line has too few fields: {line}"));
        }

        let label = fields[0]
            .parse::<usize>()
            .map_err(|_| format!("Invalid label: {}", fields[0]))?;

        let pixels = fields[1..]
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                field
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid pixel value at column {}: {}", idx + 2, field))
            })
            .collect::<std::result::Result<Vec<f64>, String>>()?;

        Ok((label, pixels))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows were read
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of pixel columns
    pub fn dim(&self) -> usize {
        self.dimensions
    }

    /// Labels in file order
    pub fn labels(&self) -> Vec<usize> {
        self.rows.iter().map(|(label, _)| *label).collect()
    }

    /// Group rows into per-class blocks
    pub fn into_class_blocks(self) -> Result<BTreeMap<usize, Array2<f64>>> {
        group_rows_by_class(self.rows, self.dimensions)
    }
}

/// Load a training CSV and a test CSV into a class-keyed dataset
pub fn load_csv_pair<P: AsRef<Path>, Q: AsRef<Path>>(
    train_path: P,
    test_path: Q,
) -> Result<DigitDataset> {
    info!(
        "Loading CSV dataset from {:?} and {:?}",
        train_path.as_ref(),
        test_path.as_ref()
    );
    let train = CSVDigits::from_file(train_path)?;
    let test = CSVDigits::from_file(test_path)?;

    if train.dim() != test.dim() {
        return Err(ClassifierError::DimensionMismatch {
            expected: train.dim(),
            actual: test.dim(),
        });
    }

    let dataset = DigitDataset::from_blocks(train.into_class_blocks()?, test.into_class_blocks()?);
    info!(
        "Loaded {} training and {} test images",
        dataset.n_train(),
        dataset.n_test()
    );
    Ok(dataset)
}
