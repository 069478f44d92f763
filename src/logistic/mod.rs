//! Logistic regression classifiers
//!
//! Two families share the helpers in this module:
//! - [`binary`]: one-vs-all, one independent binary model per class
//! - [`multinomial`]: a single jointly optimized weight matrix
//!
//! Weight layouts are bias-first: row 0 of a (D+1)×K weight matrix (or
//! element 0 of a D+1 weight vector) multiplies the constant 1.0 that is
//! prepended to every sample.

pub mod binary;
pub mod multinomial;

pub use self::binary::*;
pub use self::multinomial::*;

use crate::core::{ClassifierError, Result};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Logistic function 1 / (1 + e^(-z))
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// One-hot encode labels into an N×`n_class` matrix
pub fn one_hot(labels: ArrayView1<usize>, n_class: usize) -> Result<Array2<f64>> {
    let mut encoded = Array2::zeros((labels.len(), n_class));
    for (i, &label) in labels.iter().enumerate() {
        if label >= n_class {
            return Err(ClassifierError::InvalidDataset(format!(
                "Label {label} at row {i} is outside 0..{n_class}"
            )));
        }
        encoded[[i, label]] = 1.0;
    }
    Ok(encoded)
}

/// `w · [1, x_i]` for every row of `data`
pub(crate) fn bias_scores(data: ArrayView2<f64>, weights: ArrayView1<f64>) -> Array1<f64> {
    data.dot(&weights.slice(s![1..])) + weights[0]
}

/// `W[:, k] · [1, x_i]` for every row of `data` and every column of `weights`
pub(crate) fn bias_scores_matrix(data: ArrayView2<f64>, weights: ArrayView2<f64>) -> Array2<f64> {
    data.dot(&weights.slice(s![1.., ..])) + &weights.row(0)
}

/// Weight rows must be the feature count plus the bias row
pub(crate) fn check_weight_rows(weight_rows: usize, n_features: usize) -> Result<()> {
    if weight_rows != n_features + 1 {
        return Err(ClassifierError::DimensionMismatch {
            expected: n_features + 1,
            actual: weight_rows,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_sigmoid_at_zero() {
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn test_sigmoid_range_and_symmetry() {
        for &z in &[-30.0, -5.0, -0.3, 0.7, 4.0, 30.0] {
            let s = sigmoid(z);
            assert!(s > 0.0 && s < 1.0, "sigmoid({z}) = {s}");
            assert_relative_eq!(sigmoid(-z), 1.0 - s, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_one_hot_rows_sum_to_one() {
        let labels = array![2, 0, 1, 2];
        let encoded = one_hot(labels.view(), 3).unwrap();

        assert_eq!(encoded.dim(), (4, 3));
        assert_eq!(encoded[[0, 2]], 1.0);
        assert_eq!(encoded[[1, 0]], 1.0);
        for row in encoded.outer_iter() {
            assert_eq!(row.sum(), 1.0);
        }
    }

    #[test]
    fn test_one_hot_rejects_out_of_range_label() {
        let labels = array![0, 5];
        assert!(one_hot(labels.view(), 3).is_err());
    }

    #[test]
    fn test_bias_scores() {
        let data = array![[1.0, 2.0], [0.0, -1.0]];
        let weights = array![0.5, 1.0, -1.0];
        let scores = bias_scores(data.view(), weights.view());
        assert_eq!(scores, array![-0.5, 1.5]);
    }

    #[test]
    fn test_bias_scores_matrix() {
        let data = array![[1.0, 2.0]];
        let weights = array![[1.0, 0.0], [1.0, 2.0], [0.0, 1.0]];
        let scores = bias_scores_matrix(data.view(), weights.view());
        assert_eq!(scores, array![[2.0, 4.0]]);
    }
}
