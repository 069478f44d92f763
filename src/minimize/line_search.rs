//! Wolfe line search along a descent direction

use crate::core::{Objective, Result};
use ndarray::{Array1, ArrayView1};

/// Accepted point of a line search
#[derive(Debug, Clone)]
pub struct LineSearchStep {
    pub alpha: f64,
    pub x: Array1<f64>,
    pub value: f64,
    pub gradient: Array1<f64>,
}

/// Bracketing search for a step satisfying the Armijo and curvature conditions
///
/// ```text
/// Armijo:    f(x + α d) ≤ f(x) + c1 α ∇f(x)ᵀd
/// Curvature: |∇f(x + α d)ᵀd| ≤ c2 |∇f(x)ᵀd|
/// ```
///
/// A trial point with a non-finite value fails the Armijo test.
#[derive(Debug, Clone)]
pub struct WolfeLineSearch {
    pub c1: f64,
    pub c2: f64,
    pub max_trials: usize,
}

impl Default for WolfeLineSearch {
    fn default() -> Self {
        Self {
            c1: 1e-4,
            c2: 0.4,
            max_trials: 50,
        }
    }
}

impl WolfeLineSearch {
    pub fn new(c1: f64, c2: f64, max_trials: usize) -> Self {
        Self { c1, c2, max_trials }
    }

    /// Search along `direction` from `x`, starting at step `alpha0`
    ///
    /// `value` and `gradient` are the objective at `x`. When no trial meets
    /// both conditions, the lowest point that met the Armijo condition is
    /// returned; `None` means no trial decreased the objective enough.
    pub fn search<O: Objective + ?Sized>(
        &self,
        objective: &O,
        x: ArrayView1<f64>,
        value: f64,
        gradient: ArrayView1<f64>,
        direction: ArrayView1<f64>,
        alpha0: f64,
    ) -> Result<Option<LineSearchStep>> {
        let slope = gradient.dot(&direction);
        let mut alpha = alpha0;
        let mut alpha_lo = 0.0;
        let mut alpha_hi = f64::INFINITY;
        let mut best: Option<LineSearchStep> = None;

        for _ in 0..self.max_trials {
            let x_new = &x + &(&direction * alpha);
            let (value_new, gradient_new) = objective.evaluate(x_new.view())?;

            if !value_new.is_finite() || value_new > value + self.c1 * alpha * slope {
                alpha_hi = alpha;
                alpha = 0.5 * (alpha_lo + alpha_hi);
                continue;
            }

            let slope_new = gradient_new.dot(&direction);
            let step = LineSearchStep {
                alpha,
                x: x_new,
                value: value_new,
                gradient: gradient_new,
            };

            if slope_new.abs() <= self.c2 * slope.abs() {
                return Ok(Some(step));
            }

            if slope_new > 0.0 {
                alpha_hi = alpha;
            } else {
                alpha_lo = alpha;
            }
            if best.as_ref().map_or(true, |b| step.value < b.value) {
                best = Some(step);
            }

            alpha = if alpha_hi.is_finite() {
                0.5 * (alpha_lo + alpha_hi)
            } else {
                2.0 * alpha
            };
        }

        Ok(best)
    }
}
