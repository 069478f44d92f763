//! One-vs-all binary logistic regression

use crate::core::{Classifier, ClassifierError, Objective, Result};
use crate::logistic::{bias_scores, bias_scores_matrix, check_weight_rows, sigmoid};
use crate::minimize::{ConjugateGradient, ConvergenceStatus};
use log::{debug, info, warn};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Cross-entropy objective of one binary classifier, bound to its data
///
/// Labels are 0.0 / 1.0 indicators of the positive class.
pub struct BinaryLogisticObjective<'a> {
    data: ArrayView2<'a, f64>,
    labels: ArrayView1<'a, f64>,
}

impl<'a> BinaryLogisticObjective<'a> {
    pub fn new(data: ArrayView2<'a, f64>, labels: ArrayView1<'a, f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(ClassifierError::EmptyDataset);
        }
        if data.nrows() != labels.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: data.nrows(),
                actual: labels.len(),
            });
        }
        Ok(Self { data, labels })
    }
}

impl Objective for BinaryLogisticObjective<'_> {
    fn dim(&self) -> usize {
        self.data.ncols() + 1
    }

    /// Mean cross-entropy and its gradient
    ///
    /// Saturated predictions (θ exactly 0 or 1) make the loss non-finite;
    /// the minimizer rejects such points.
    fn evaluate(&self, params: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
        if params.len() != self.dim() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.dim(),
                actual: params.len(),
            });
        }

        let n = self.data.nrows() as f64;
        let theta = bias_scores(self.data, params).mapv(sigmoid);
        let residual = &theta - &self.labels;

        let mut gradient = Array1::zeros(self.dim());
        gradient[0] = residual.sum() / n;
        gradient
            .slice_mut(s![1..])
            .assign(&(self.data.t().dot(&residual) / n));

        let log_likelihood: f64 = theta
            .iter()
            .zip(self.labels.iter())
            .map(|(&t, &y)| y * t.ln() + (1.0 - y) * (1.0 - t).ln())
            .sum();

        Ok((-log_likelihood / n, gradient))
    }
}

/// Loss and gradient of a binary logistic model at `weights`
pub fn binary_objective(
    weights: ArrayView1<f64>,
    data: ArrayView2<f64>,
    labels: ArrayView1<f64>,
) -> Result<(f64, Array1<f64>)> {
    BinaryLogisticObjective::new(data.view(), labels.view())?.evaluate(weights)
}

/// Predict with a (D+1)×K one-vs-all weight matrix
///
/// Classes are scanned in index order and the first whose confidence beats
/// its complement wins; a sample no classifier claims gets label 0.
pub fn predict_one_vs_all(weights: ArrayView2<f64>, data: ArrayView2<f64>) -> Result<Array1<usize>> {
    check_weight_rows(weights.nrows(), data.ncols())?;

    let scores = bias_scores_matrix(data, weights);
    Ok(scores
        .outer_iter()
        .map(|row| {
            row.iter()
                .position(|&z| {
                    let c1 = sigmoid(z);
                    let c2 = 1.0 - c1;
                    c1 > c2
                })
                .unwrap_or(0)
        })
        .collect())
}

/// Trained one-vs-all model
#[derive(Debug, Clone, PartialEq)]
pub struct OneVsAllModel {
    weights: Array2<f64>,
}

impl OneVsAllModel {
    /// Wrap a (D+1)×K weight matrix, e.g. one reloaded from disk
    pub fn from_weights(weights: Array2<f64>) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn n_class(&self) -> usize {
        self.weights.ncols()
    }
}

impl Classifier for OneVsAllModel {
    fn predict(&self, data: ArrayView2<f64>) -> Result<Array1<usize>> {
        predict_one_vs_all(self.weights.view(), data)
    }
}

/// Train one binary classifier per class, each from a zero weight vector
pub fn train_one_vs_all(
    data: ArrayView2<f64>,
    labels: ArrayView1<usize>,
    n_class: usize,
    minimizer: &ConjugateGradient,
) -> Result<OneVsAllModel> {
    let n_params = data.ncols() + 1;
    let mut weights = Array2::zeros((n_params, n_class));

    for class in 0..n_class {
        let indicator = labels.mapv(|label| if label == class { 1.0 } else { 0.0 });
        let objective = BinaryLogisticObjective::new(data.view(), indicator.view())?;

        let result = minimizer.minimize(&objective, Array1::zeros(n_params))?;
        debug!(
            "Class {class}: loss {:.6} after {} iterations ({:?})",
            result.objective_value, result.iterations, result.status
        );
        if result.status == ConvergenceStatus::Stalled {
            warn!("Class {class}: line search stalled at loss {:.6}", result.objective_value);
        }

        weights.column_mut(class).assign(&result.solution);
    }

    info!("Trained {n_class} one-vs-all classifiers on {} samples", data.nrows());
    Ok(OneVsAllModel { weights })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_objective_at_zero_weights() {
        let data = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        let labels = array![1.0, 0.0, 1.0, 0.0];
        let weights = Array1::zeros(3);

        let (loss, gradient) = binary_objective(weights.view(), data.view(), labels.view()).unwrap();

        // Every prediction is 0.5
        assert_relative_eq!(loss, std::f64::consts::LN_2, epsilon = 1e-12);
        assert_eq!(gradient.len(), 3);
        // Residuals: -0.5, 0.5, -0.5, 0.5
        assert_relative_eq!(gradient[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(gradient[1], (-0.5 - 0.5) / 4.0, epsilon = 1e-12);
        assert_relative_eq!(gradient[2], (0.5 - 0.5) / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let data = array![[0.2, 0.9], [0.7, 0.1], [0.4, 0.4]];
        let labels = array![1.0, 0.0, 1.0];
        let weights = array![0.1, -0.3, 0.8];
        let objective = BinaryLogisticObjective::new(data.view(), labels.view()).unwrap();

        let (_, gradient) = objective.evaluate(weights.view()).unwrap();
        let h = 1e-6;
        for j in 0..weights.len() {
            let mut plus = weights.clone();
            let mut minus = weights.clone();
            plus[j] += h;
            minus[j] -= h;
            let (f_plus, _) = objective.evaluate(plus.view()).unwrap();
            let (f_minus, _) = objective.evaluate(minus.view()).unwrap();
            assert_relative_eq!(gradient[j], (f_plus - f_minus) / (2.0 * h), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_objective_borrows_independent_views() {
        let data = array![[0.5, 1.0], [1.5, -1.0]];
        let (loss, gradient) = {
            // Labels built in a shorter scope than the data
            let labels = array![1.0, 0.0];
            binary_objective(Array1::<f64>::zeros(3).view(), data.view(), labels.view()).unwrap()
        };
        assert_relative_eq!(loss, std::f64::consts::LN_2, epsilon = 1e-12);
        assert_eq!(gradient.len(), 3);
    }

    #[test]
    fn test_loss_is_non_negative() {
        let data = array![[3.0, -1.0], [-2.0, 0.5]];
        let labels = array![0.0, 1.0];
        for weights in [array![0.0, 0.0, 0.0], array![1.0, 2.0, -3.0], array![-4.0, 0.1, 0.2]] {
            let (loss, _) = binary_objective(weights.view(), data.view(), labels.view()).unwrap();
            assert!(loss >= 0.0);
        }
    }

    #[test]
    fn test_objective_shape_mismatch() {
        let data = array![[1.0, 2.0]];
        let labels = array![1.0];
        let weights = array![0.0, 0.0];
        assert!(matches!(
            binary_objective(weights.view(), data.view(), labels.view()),
            Err(ClassifierError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_predict_first_match_wins() {
        // Column 0 weakly claims the sample, column 1 claims it strongly
        let weights = array![[0.1, 10.0], [0.0, 0.0]];
        let data = array![[5.0]];
        let labels = predict_one_vs_all(weights.view(), data.view()).unwrap();
        assert_eq!(labels, array![0]);
    }

    #[test]
    fn test_predict_defaults_to_zero() {
        let weights = array![[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0]];
        let data = array![[1.0], [2.0]];
        let labels = predict_one_vs_all(weights.view(), data.view()).unwrap();
        assert_eq!(labels, array![0, 0]);
    }

    #[test]
    fn test_predict_later_class() {
        let weights = array![[-1.0, -1.0, 1.0], [0.0, 0.0, 0.0]];
        let data = array![[1.0]];
        let model = OneVsAllModel::from_weights(weights);
        assert_eq!(model.predict(data.view()).unwrap(), array![2]);
        // No hidden state between calls
        assert_eq!(model.predict(data.view()).unwrap(), array![2]);
    }

    #[test]
    fn test_predict_shape_mismatch() {
        let weights = Array2::zeros((4, 10));
        let data = array![[1.0, 2.0]];
        assert!(predict_one_vs_all(weights.view(), data.view()).is_err());
    }

    #[test]
    fn test_train_one_vs_all_weight_shape() {
        let data = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let labels = array![0, 1, 2];
        let minimizer = ConjugateGradient::new(20, 1e-5);

        let model = train_one_vs_all(data.view(), labels.view(), 3, &minimizer).unwrap();
        assert_eq!(model.weights().dim(), (3, 3));
        assert_eq!(model.n_class(), 3);
    }
}
