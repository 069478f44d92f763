//! Nonlinear conjugate gradient (Polak–Ribière+)

use crate::core::{ClassifierError, Objective, Result};
use crate::minimize::{ConvergenceStatus, MinimizeResult, WolfeLineSearch};
use log::{debug, trace};
use ndarray::{Array1, ArrayView1};
use std::time::Instant;

/// Conjugate gradient minimizer
///
/// Directions are updated with the Polak–Ribière formula clipped at zero,
/// and reset to steepest descent whenever they stop being descent
/// directions. Each iteration's first trial step is scaled from the
/// previous decrease in the objective.
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    pub max_iter: usize,
    /// Tolerance on the gradient infinity norm
    pub gtol: f64,
    pub line_search: WolfeLineSearch,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self::new(100, 1e-5)
    }
}

impl ConjugateGradient {
    pub fn new(max_iter: usize, gtol: f64) -> Self {
        Self {
            max_iter,
            gtol,
            line_search: WolfeLineSearch::default(),
        }
    }

    pub fn with_line_search(mut self, line_search: WolfeLineSearch) -> Self {
        self.line_search = line_search;
        self
    }

    /// Minimize `objective` starting from `x0`
    pub fn minimize<O: Objective + ?Sized>(
        &self,
        objective: &O,
        x0: Array1<f64>,
    ) -> Result<MinimizeResult> {
        if x0.len() != objective.dim() {
            return Err(ClassifierError::DimensionMismatch {
                expected: objective.dim(),
                actual: x0.len(),
            });
        }

        let start = Instant::now();
        let mut x = x0;
        let (mut value, mut gradient) = objective.evaluate(x.view())?;
        if !value.is_finite() {
            return Err(ClassifierError::NumericalSaturation(value));
        }

        let mut direction = -&gradient;
        let mut previous_value = value + gradient.dot(&gradient).sqrt() / 2.0;

        let finish = |x, value, gradient: &Array1<f64>, iterations, status| MinimizeResult {
            solution: x,
            objective_value: value,
            iterations,
            status,
            gradient_norm: inf_norm(gradient.view()),
            elapsed: start.elapsed(),
        };

        for iter in 0..self.max_iter {
            if inf_norm(gradient.view()) < self.gtol {
                debug!("Converged after {iter} iterations at {value:.6}");
                return Ok(finish(x, value, &gradient, iter, ConvergenceStatus::Converged));
            }

            let mut slope = gradient.dot(&direction);
            if slope >= 0.0 {
                direction = -&gradient;
                slope = -gradient.dot(&gradient);
            }

            let alpha0 = initial_step(value, previous_value, slope);
            let step = match self.line_search.search(
                objective,
                x.view(),
                value,
                gradient.view(),
                direction.view(),
                alpha0,
            )? {
                Some(step) => step,
                None => {
                    debug!("Line search stalled at iteration {iter}");
                    return Ok(finish(x, value, &gradient, iter, ConvergenceStatus::Stalled));
                }
            };
            trace!("Iteration {iter}: step {:.3e}, value {:.6}", step.alpha, step.value);

            let beta = polak_ribiere(step.gradient.view(), gradient.view());
            direction = &direction * beta - &step.gradient;

            previous_value = value;
            x = step.x;
            value = step.value;
            gradient = step.gradient;
        }

        Ok(finish(
            x,
            value,
            &gradient,
            self.max_iter,
            ConvergenceStatus::MaxIterations,
        ))
    }
}

/// β = max(0, g₁ᵀ(g₁ − g₀) / g₀ᵀg₀)
fn polak_ribiere(new_gradient: ArrayView1<f64>, old_gradient: ArrayView1<f64>) -> f64 {
    let denominator = old_gradient.dot(&old_gradient);
    if denominator == 0.0 {
        return 0.0;
    }
    let numerator = new_gradient.dot(&(&new_gradient - &old_gradient));
    (numerator / denominator).max(0.0)
}

fn initial_step(value: f64, previous_value: f64, slope: f64) -> f64 {
    let alpha = 1.01 * 2.0 * (value - previous_value) / slope;
    if alpha.is_finite() && alpha > 0.0 {
        alpha.min(1.0)
    } else {
        1.0
    }
}

fn inf_norm(v: ArrayView1<f64>) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// ½ xᵀAx − bᵀx with a diagonal A
    struct Quadratic {
        diagonal: Array1<f64>,
        b: Array1<f64>,
    }

    impl Objective for Quadratic {
        fn dim(&self) -> usize {
            self.b.len()
        }

        fn evaluate(&self, params: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
            let ax = &self.diagonal * &params;
            let value = 0.5 * params.dot(&ax) - self.b.dot(&params);
            Ok((value, ax - &self.b))
        }
    }

    struct Rosenbrock;

    impl Objective for Rosenbrock {
        fn dim(&self) -> usize {
            2
        }

        fn evaluate(&self, params: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
            let (a, b) = (params[0], params[1]);
            let value = (1.0 - a).powi(2) + 100.0 * (b - a * a).powi(2);
            let gradient = array![
                -2.0 * (1.0 - a) - 400.0 * a * (b - a * a),
                200.0 * (b - a * a)
            ];
            Ok((value, gradient))
        }
    }

    struct AlwaysInfinite;

    impl Objective for AlwaysInfinite {
        fn dim(&self) -> usize {
            1
        }

        fn evaluate(&self, _params: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
            Ok((f64::INFINITY, array![0.0]))
        }
    }

    #[test]
    fn test_minimizes_quadratic() {
        let objective = Quadratic {
            diagonal: array![1.0, 4.0, 10.0],
            b: array![1.0, 2.0, -5.0],
        };
        let result = ConjugateGradient::default()
            .minimize(&objective, Array1::zeros(3))
            .unwrap();

        assert_eq!(result.status, ConvergenceStatus::Converged);
        assert!(result.gradient_norm < 1e-5);
        assert_relative_eq!(result.solution[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(result.solution[1], 0.5, epsilon = 1e-4);
        assert_relative_eq!(result.solution[2], -0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_already_optimal_start() {
        let objective = Quadratic {
            diagonal: array![2.0],
            b: array![0.0],
        };
        let result = ConjugateGradient::default()
            .minimize(&objective, array![0.0])
            .unwrap();
        assert!(result.converged());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_iteration_cap() {
        let result = ConjugateGradient::new(3, 1e-12)
            .minimize(&Rosenbrock, array![-1.2, 1.0])
            .unwrap();
        assert_eq!(result.status, ConvergenceStatus::MaxIterations);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn test_rosenbrock_decreases() {
        let start = array![-1.2, 1.0];
        let (initial, _) = Rosenbrock.evaluate(start.view()).unwrap();
        let result = ConjugateGradient::new(2000, 1e-6)
            .minimize(&Rosenbrock, start)
            .unwrap();
        assert!(result.objective_value < initial);
        assert!(result.objective_value.is_finite());
    }

    #[test]
    fn test_non_finite_start_is_rejected() {
        assert!(matches!(
            ConjugateGradient::default().minimize(&AlwaysInfinite, array![0.0]),
            Err(ClassifierError::NumericalSaturation(_))
        ));
    }

    #[test]
    fn test_start_dimension_checked() {
        let objective = Quadratic {
            diagonal: array![1.0, 1.0],
            b: array![0.0, 0.0],
        };
        assert!(matches!(
            ConjugateGradient::default().minimize(&objective, Array1::zeros(3)),
            Err(ClassifierError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_polak_ribiere_is_clipped() {
        let beta = polak_ribiere(array![0.0, 1.0].view(), array![0.0, 2.0].view());
        assert_eq!(beta, 0.0);
        let beta = polak_ribiere(array![2.0, 0.0].view(), array![1.0, 0.0].view());
        assert_relative_eq!(beta, 2.0);
    }
}
