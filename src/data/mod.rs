//! Data loading and preparation
//!
//! Loaders turn raw digit images into a [`DigitDataset`], a class-keyed
//! collection of training and test blocks. The preparer turns that into the
//! three labeled partitions every classifier consumes.

pub mod csv;
pub mod idx;
pub mod prepare;

pub use self::csv::*;
pub use self::idx::*;
pub use self::prepare::*;

use crate::core::{ClassifierError, Result, Split};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Raw digit images grouped by class, separately for training and testing
#[derive(Debug, Clone, Default)]
pub struct DigitDataset {
    train: BTreeMap<usize, Array2<f64>>,
    test: BTreeMap<usize, Array2<f64>>,
}

impl DigitDataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from already grouped blocks
    pub fn from_blocks(
        train: BTreeMap<usize, Array2<f64>>,
        test: BTreeMap<usize, Array2<f64>>,
    ) -> Self {
        Self { train, test }
    }

    /// Set the training block for `class`
    pub fn insert_train(&mut self, class: usize, block: Array2<f64>) {
        self.train.insert(class, block);
    }

    /// Set the test block for `class`
    pub fn insert_test(&mut self, class: usize, block: Array2<f64>) {
        self.test.insert(class, block);
    }

    /// Training block for `class`
    pub fn train_block(&self, class: usize) -> Result<&Array2<f64>> {
        self.train
            .get(&class)
            .ok_or(ClassifierError::MissingClass(class))
    }

    /// Test block for `class`
    pub fn test_block(&self, class: usize) -> Result<&Array2<f64>> {
        self.test
            .get(&class)
            .ok_or(ClassifierError::MissingClass(class))
    }

    /// Class keys present in the training blocks
    pub fn classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.train.keys().copied()
    }

    /// Total number of training rows across all classes
    pub fn n_train(&self) -> usize {
        self.train.values().map(|b| b.nrows()).sum()
    }

    /// Total number of test rows across all classes
    pub fn n_test(&self) -> usize {
        self.test.values().map(|b| b.nrows()).sum()
    }
}

/// One labeled partition: N×D samples and their class labels
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSplit {
    pub data: Array2<f64>,
    pub labels: Array1<usize>,
}

impl LabeledSplit {
    /// Pair a sample matrix with its labels
    pub fn new(data: Array2<f64>, labels: Array1<usize>) -> Result<Self> {
        if data.nrows() != labels.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: data.nrows(),
                actual: labels.len(),
            });
        }
        Ok(Self { data, labels })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if the partition holds no samples
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of features per sample
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }
}

/// Output of the preparer: three partitions with a shared feature space
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: LabeledSplit,
    pub validation: LabeledSplit,
    pub test: LabeledSplit,
    /// Raw column indices that survived feature pruning
    pub kept_features: Vec<usize>,
    pub n_class: usize,
}

impl PreparedData {
    /// Partition by name
    pub fn split(&self, split: Split) -> &LabeledSplit {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }

    /// Number of features after pruning
    pub fn n_features(&self) -> usize {
        self.train.n_features()
    }
}

/// Group flat rows into per-class blocks, preserving row order within a class
pub(crate) fn group_rows_by_class<I>(
    rows: I,
    n_features: usize,
) -> Result<BTreeMap<usize, Array2<f64>>>
where
    I: IntoIterator<Item = (usize, Vec<f64>)>,
{
    let mut grouped: BTreeMap<usize, (usize, Vec<f64>)> = BTreeMap::new();

    for (label, row) in rows {
        if row.len() != n_features {
            return Err(ClassifierError::DimensionMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        let entry = grouped.entry(label).or_insert_with(|| (0, Vec::new()));
        entry.0 += 1;
        entry.1.extend(row);
    }

    grouped
        .into_iter()
        .map(|(label, (count, flat))| {
            Array2::from_shape_vec((count, n_features), flat)
                .map(|block| (label, block))
                .map_err(|e| ClassifierError::InvalidDataset(e.to_string()))
        })
        .collect()
}
