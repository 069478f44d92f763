//! Core type definitions shared by the classifiers

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary prediction containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Build a sparse vector from a dense row, dropping exact zeros
    ///
    /// Digit images are mostly background, so this keeps kernel evaluations
    /// proportional to the number of inked pixels.
    pub fn from_dense(row: ArrayView1<f64>) -> Self {
        let (indices, values) = row
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Binary training sample with features and a ±1 label
#[derive(Clone, Debug)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label (+1 or -1)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self { features, label }
    }
}

/// Result of the SMO optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Lagrange multipliers (alpha values)
    pub alpha: Vec<f64>,
    /// Bias term (b)
    pub b: f64,
    /// Indices of support vectors (where alpha > 0)
    pub support_vectors: Vec<usize>,
    /// Number of iterations performed
    pub iterations: usize,
}

/// Configuration for the SMO solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub epsilon: f64,
    /// Maximum number of passes over the working set
    pub max_iterations: usize,
    /// Kernel cache size in bytes
    pub cache_size: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.001,
            max_iterations: 10_000,
            cache_size: 200 * 1024 * 1024,
        }
    }
}

/// The three data partitions produced by the preparer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    /// All partitions in reporting order
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Split::Train => "Training",
            Split::Validation => "Validation",
            Split::Test => "Testing",
        };
        f.write_str(name)
    }
}

/// Percentage accuracy of a classifier on each partition
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitAccuracy {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl SplitAccuracy {
    /// Accuracy for one partition
    pub fn get(&self, split: Split) -> f64 {
        match split {
            Split::Train => self.train,
            Split::Validation => self.validation,
            Split::Test => self.test,
        }
    }

    /// Record accuracy for one partition
    pub fn set(&mut self, split: Split, accuracy: f64) {
        match split {
            Split::Train => self.train = accuracy,
            Split::Validation => self.validation = accuracy,
            Split::Test => self.test = accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sparse_vector_creation() {
        let sv = SparseVector::new(vec![2, 0, 4], vec![2.0, 1.0, 3.0]);

        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sparse_vector_from_dense() {
        let row = array![0.0, 0.5, 0.0, 0.0, 1.0];
        let sv = SparseVector::from_dense(row.view());

        assert_eq!(sv.indices, vec![1, 4]);
        assert_eq!(sv.values, vec![0.5, 1.0]);
        assert_eq!(sv.get(0), 0.0);
        assert_eq!(sv.get(4), 1.0);
        assert_eq!(sv.nnz(), 2);
    }

    #[test]
    fn test_sparse_vector_all_zero_row() {
        let row = array![0.0, 0.0, 0.0];
        assert!(SparseVector::from_dense(row.view()).is_empty());
    }

    #[test]
    fn test_sparse_vector_norm() {
        let sv = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        assert_eq!(sv.norm_squared(), 25.0);
    }

    #[test]
    fn test_prediction() {
        let pred = Prediction::new(-1.0, -1.8);
        assert_eq!(pred.label, -1.0);
        assert_eq!(pred.confidence(), 1.8);
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.c, 1.0);
        assert_eq!(config.epsilon, 0.001);
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.cache_size, 200 * 1024 * 1024);
    }

    #[test]
    fn test_split_accuracy_accessors() {
        let mut acc = SplitAccuracy::default();
        acc.set(Split::Validation, 91.5);
        assert_eq!(acc.get(Split::Validation), 91.5);
        assert_eq!(acc.get(Split::Train), 0.0);
        assert_eq!(Split::Test.to_string(), "Testing");
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }
}
