//! Gradient-based minimization of [`Objective`](crate::core::Objective)s
//!
//! Objectives bind their own data and expose `(loss, gradient)` at a flat
//! parameter vector; the minimizers here never see anything else.

pub mod conjugate_gradient;
pub mod line_search;

pub use self::conjugate_gradient::*;
pub use self::line_search::*;

use ndarray::Array1;
use std::time::Duration;

/// Why a minimization stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// Gradient infinity norm fell below the tolerance
    Converged,
    /// Iteration cap reached
    MaxIterations,
    /// The line search found no acceptable step
    Stalled,
}

/// Outcome of a minimization
#[derive(Debug, Clone)]
pub struct MinimizeResult {
    pub solution: Array1<f64>,
    pub objective_value: f64,
    pub iterations: usize,
    pub status: ConvergenceStatus,
    /// Infinity norm of the gradient at `solution`
    pub gradient_norm: f64,
    pub elapsed: Duration,
}

impl MinimizeResult {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}
