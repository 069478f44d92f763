//! Small helpers shared by the driver and the classifiers

pub use self::metrics::*;
pub use self::sampling::*;

/// Evaluation helpers
pub mod metrics {
    use crate::core::{ClassifierError, Result};
    use ndarray::ArrayView1;
    use std::collections::BTreeMap;

    /// Percentage of positions where `predicted` equals `actual`
    pub fn accuracy_percent(predicted: ArrayView1<usize>, actual: ArrayView1<usize>) -> Result<f64> {
        if predicted.len() != actual.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: actual.len(),
                actual: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }

        let correct = predicted
            .iter()
            .zip(actual.iter())
            .filter(|(p, a)| p == a)
            .count();
        Ok(100.0 * correct as f64 / actual.len() as f64)
    }

    /// Number of samples per label
    pub fn class_counts(labels: ArrayView1<usize>) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

/// Deterministic row sub-sampling
pub mod sampling {
    /// Up to `limit` indices spread evenly over `0..n`, in ascending order
    ///
    /// Data grouped by class keeps every class represented as long as each
    /// class has at least `n / limit` rows.
    pub fn strided_indices(n: usize, limit: usize) -> Vec<usize> {
        if limit >= n {
            return (0..n).collect();
        }
        (0..limit).map(|k| k * n / limit).collect()
    }
}

/// Memory sizing for the SVM kernel cache
pub mod memory {
    /// Bytes the cache would need to hold the full triangular kernel matrix
    pub fn estimate_kernel_cache_memory(n_samples: usize) -> usize {
        let max_entries = n_samples.saturating_mul(n_samples + 1) / 2;
        max_entries.saturating_mul(48)
    }

    /// Cache size for `n_samples` rows given `available_memory_mb`
    ///
    /// Uses at most half of the available memory.
    pub fn recommend_cache_size(n_samples: usize, available_memory_mb: usize) -> usize {
        let available_bytes = available_memory_mb.saturating_mul(1024 * 1024);
        estimate_kernel_cache_memory(n_samples).min(available_bytes / 2)
    }
}
