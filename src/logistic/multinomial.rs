//! Jointly optimized multi-class logistic regression
//!
//! Each class keeps its own sigmoid output; scores are not normalized
//! across classes, neither in the loss nor in prediction.

use crate::core::{Classifier, ClassifierError, Objective, Result};
use crate::logistic::{bias_scores_matrix, check_weight_rows, one_hot, sigmoid};
use crate::minimize::{ConjugateGradient, ConvergenceStatus};
use log::{info, warn};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Summed cross-entropy of K per-class sigmoids, bound to its data
///
/// Parameters are a (D+1)×K weight matrix flattened in row-major order.
pub struct MultinomialLogisticObjective<'a> {
    data: ArrayView2<'a, f64>,
    targets: ArrayView2<'a, f64>,
}

impl<'a> MultinomialLogisticObjective<'a> {
    /// Bind N×D samples and their N×K one-hot targets
    pub fn new(data: ArrayView2<'a, f64>, targets: ArrayView2<'a, f64>) -> Result<Self> {
        if data.nrows() != targets.nrows() {
            return Err(ClassifierError::DimensionMismatch {
                expected: data.nrows(),
                actual: targets.nrows(),
            });
        }
        if targets.ncols() == 0 {
            return Err(ClassifierError::InvalidParameter(
                "One-hot targets need at least one class".to_string(),
            ));
        }
        Ok(Self { data, targets })
    }

    pub fn n_class(&self) -> usize {
        self.targets.ncols()
    }

    /// Shape of the unflattened weight matrix
    pub fn weight_shape(&self) -> (usize, usize) {
        (self.data.ncols() + 1, self.n_class())
    }
}

impl Objective for MultinomialLogisticObjective<'_> {
    fn dim(&self) -> usize {
        let (rows, cols) = self.weight_shape();
        rows * cols
    }

    /// `-Σ_i Σ_k t_ik ln σ(w_k·x_i)` and its flattened (D+1)×K gradient
    fn evaluate(&self, params: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
        let actual = params.len();
        let weights = params
            .into_shape(self.weight_shape())
            .map_err(|_| ClassifierError::DimensionMismatch {
                expected: self.dim(),
                actual,
            })?;

        let theta = bias_scores_matrix(self.data, weights).mapv(sigmoid);
        let residual = &theta - &self.targets;

        let mut gradient = Array2::zeros(self.weight_shape());
        gradient.row_mut(0).assign(&residual.sum_axis(Axis(0)));
        gradient
            .slice_mut(s![1.., ..])
            .assign(&self.data.t().dot(&residual));

        let loss = -(&self.targets * &theta.mapv(f64::ln)).sum();

        Ok((loss, Array1::from(gradient.into_raw_vec())))
    }
}

/// Loss and flattened gradient of the multinomial model at `flat_weights`
pub fn multinomial_objective(
    flat_weights: ArrayView1<f64>,
    data: ArrayView2<f64>,
    targets: ArrayView2<f64>,
) -> Result<(f64, Array1<f64>)> {
    MultinomialLogisticObjective::new(data.view(), targets.view())?.evaluate(flat_weights)
}

/// Arg-max of `exp(w_k · x)` per sample; ties go to the lowest class
pub fn predict_multinomial(weights: ArrayView2<f64>, data: ArrayView2<f64>) -> Result<Array1<usize>> {
    check_weight_rows(weights.nrows(), data.ncols())?;

    let scores = bias_scores_matrix(data, weights);
    Ok(scores
        .outer_iter()
        .map(|row| {
            let mut max_val = -1.0;
            let mut max_index = 0;
            for (k, &z) in row.iter().enumerate() {
                let num = z.exp();
                if num > max_val {
                    max_val = num;
                    max_index = k;
                }
            }
            max_index
        })
        .collect())
}

/// Trained multinomial model
#[derive(Debug, Clone, PartialEq)]
pub struct MultinomialModel {
    weights: Array2<f64>,
}

impl MultinomialModel {
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

impl Classifier for MultinomialModel {
    fn predict(&self, data: ArrayView2<f64>) -> Result<Array1<usize>> {
        predict_multinomial(self.weights.view(), data)
    }
}

/// Minimize the joint objective from a zero weight matrix
pub fn train_multinomial(
    data: ArrayView2<f64>,
    labels: ArrayView1<usize>,
    n_class: usize,
    minimizer: &ConjugateGradient,
) -> Result<MultinomialModel> {
    let targets = one_hot(labels, n_class)?;
    let objective = MultinomialLogisticObjective::new(data.view(), targets.view())?;

    let result = minimizer.minimize(&objective, Array1::zeros(objective.dim()))?;
    info!(
        "Multinomial model: loss {:.4} after {} iterations ({:?})",
        result.objective_value, result.iterations, result.status
    );
    if result.status == ConvergenceStatus::Stalled {
        warn!("Multinomial line search stalled at loss {:.4}", result.objective_value);
    }

    let weights = Array2::from_shape_vec(objective.weight_shape(), result.solution.to_vec())
        .map_err(|e| ClassifierError::InvalidParameter(e.to_string()))?;
    Ok(MultinomialModel { weights })
}
