//! Core traits shared by the minimizer, the models and the driver

use crate::core::{Prediction, Result, Sample};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Differentiable objective handed to a gradient-based minimizer
///
/// Implementors bind their training data at construction so the minimizer
/// only ever sees the parameter vector.
pub trait Objective {
    /// Length of the flat parameter vector
    fn dim(&self) -> usize;

    /// Evaluate the loss and its gradient at `params`
    fn evaluate(&self, params: ArrayView1<f64>) -> Result<(f64, Array1<f64>)>;
}

/// Multi-class classifier over dense sample matrices
pub trait Classifier {
    /// Predict one class label per row of `data`
    fn predict(&self, data: ArrayView2<f64>) -> Result<Array1<usize>>;
}

/// Trained binary SVM
pub trait SVMModel {
    /// Predict a single sample
    fn predict(&self, sample: &Sample) -> Prediction;

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}
