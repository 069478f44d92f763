//! Sequential Minimal Optimization (SMO) solver
//!
//! Solves the dual of the soft-margin SVM for ±1 labels. The decision
//! function is `f(x) = Σ α_i y_i K(x_i, x) + b`, and the error cache holds
//! `E_i = f(x_i) - y_i` with the running bias included.

use crate::cache::KernelCache;
use crate::core::{ClassifierError, OptimizationResult, Result, Sample, SolverConfig};
use crate::kernel::Kernel;
use log::{debug, trace};
use std::sync::Arc;

/// SMO solver for one binary problem
pub struct SMOSolver<K: Kernel> {
    kernel: Arc<K>,
    config: SolverConfig,
}

/// Mutable state of one solve
struct SolverState<'a> {
    samples: &'a [Sample],
    norms: Vec<f64>,
    alpha: Vec<f64>,
    errors: Vec<f64>,
    bias: f64,
    cache: KernelCache,
}

impl<K: Kernel> SMOSolver<K> {
    pub fn new(kernel: Arc<K>, config: SolverConfig) -> Self {
        Self { kernel, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the dual problem for `samples`
    pub fn solve(&self, samples: &[Sample]) -> Result<OptimizationResult> {
        if samples.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }
        if let Some(bad) = samples.iter().find(|s| s.label != 1.0 && s.label != -1.0) {
            return Err(ClassifierError::InvalidLabel(bad.label));
        }
        if self.config.c <= 0.0 {
            return Err(ClassifierError::InvalidParameter(format!(
                "C must be positive, got: {}",
                self.config.c
            )));
        }

        let n = samples.len();

        // A one-class problem has no margin; the bias alone reproduces the label
        if samples.iter().all(|s| s.label == samples[0].label) {
            return Ok(OptimizationResult {
                alpha: vec![0.0; n],
                b: samples[0].label,
                support_vectors: Vec::new(),
                iterations: 0,
            });
        }

        let mut state = SolverState {
            samples,
            norms: samples.iter().map(|s| s.features.norm_squared()).collect(),
            alpha: vec![0.0; n],
            errors: samples.iter().map(|s| -s.label).collect(),
            bias: 0.0,
            cache: KernelCache::for_problem(self.config.cache_size, n),
        };

        let mut iterations = 0;
        let mut num_changed = 0;
        let mut examine_all = true;

        while (num_changed > 0 || examine_all) && iterations < self.config.max_iterations {
            num_changed = 0;

            for i in 0..n {
                let non_bound = state.alpha[i] > 0.0 && state.alpha[i] < self.config.c;
                if (examine_all || non_bound) && self.examine_example(i, &mut state) {
                    num_changed += 1;
                }
            }
            trace!("Pass {iterations}: {num_changed} multipliers changed");

            if examine_all {
                examine_all = false;
            } else if num_changed == 0 {
                examine_all = true;
            }
            iterations += 1;
        }

        let b = self.refine_bias(&state);
        let support_vectors: Vec<usize> = state
            .alpha
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 0.0)
            .map(|(i, _)| i)
            .collect();

        debug!(
            "SMO finished after {iterations} passes: {} support vectors, cache hit rate {:.1}%",
            support_vectors.len(),
            100.0 * state.cache.hit_rate()
        );

        Ok(OptimizationResult {
            alpha: state.alpha,
            b,
            support_vectors,
            iterations,
        })
    }

    fn kernel_value(&self, state: &mut SolverState, i: usize, j: usize) -> f64 {
        let samples = state.samples;
        let norms = &state.norms;
        let kernel = &self.kernel;
        state.cache.get_or_compute(i, j, || {
            kernel.compute_with_norms(&samples[i].features, &samples[j].features, norms[i], norms[j])
        })
    }

    /// Try to make progress on multiplier `i` if it violates the KKT conditions
    fn examine_example(&self, i: usize, state: &mut SolverState) -> bool {
        let tol = self.config.epsilon;
        let c = self.config.c;
        let alpha_i = state.alpha[i];
        let r_i = state.errors[i] * state.samples[i].label;

        if !((r_i < -tol && alpha_i < c) || (r_i > tol && alpha_i > 0.0)) {
            return false;
        }

        // Second choice: maximal |E_i - E_j|
        let e_i = state.errors[i];
        let best = state
            .errors
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .max_by(|(_, a), (_, b)| (e_i - **a).abs().total_cmp(&(e_i - **b).abs()))
            .map(|(j, _)| j);

        if let Some(j) = best {
            if self.take_step(i, j, state) {
                return true;
            }
        }

        // Fall back to the non-bound multipliers, then to everything else
        let n = state.samples.len();
        let candidates: Vec<usize> = (1..n).map(|offset| (i + offset) % n).collect();
        for pass_non_bound in [true, false] {
            for &j in &candidates {
                if Some(j) == best {
                    continue;
                }
                let non_bound = state.alpha[j] > 0.0 && state.alpha[j] < c;
                if non_bound == pass_non_bound && self.take_step(i, j, state) {
                    return true;
                }
            }
        }

        false
    }

    /// Jointly optimize multipliers `i` and `j`
    fn take_step(&self, i: usize, j: usize, state: &mut SolverState) -> bool {
        if i == j {
            return false;
        }

        let c = self.config.c;
        let eps = self.config.epsilon;
        let y_i = state.samples[i].label;
        let y_j = state.samples[j].label;
        let alpha_i_old = state.alpha[i];
        let alpha_j_old = state.alpha[j];
        let e_i = state.errors[i];
        let e_j = state.errors[j];
        let s = y_i * y_j;

        let (low, high) = if y_i != y_j {
            let diff = alpha_j_old - alpha_i_old;
            (0.0_f64.max(diff), c.min(c + diff))
        } else {
            let sum = alpha_i_old + alpha_j_old;
            (0.0_f64.max(sum - c), c.min(sum))
        };
        if low >= high {
            return false;
        }

        let k_ii = self.kernel_value(state, i, i);
        let k_ij = self.kernel_value(state, i, j);
        let k_jj = self.kernel_value(state, j, j);
        let eta = k_ii + k_jj - 2.0 * k_ij;
        if eta <= 0.0 {
            return false;
        }

        let alpha_j_new = (alpha_j_old + y_j * (e_i - e_j) / eta).clamp(low, high);
        if (alpha_j_new - alpha_j_old).abs() < eps * (alpha_j_new + alpha_j_old + eps) {
            return false;
        }
        let alpha_i_new = alpha_i_old + s * (alpha_j_old - alpha_j_new);

        let delta_i = y_i * (alpha_i_new - alpha_i_old);
        let delta_j = y_j * (alpha_j_new - alpha_j_old);

        let b_i = state.bias - e_i - delta_i * k_ii - delta_j * k_ij;
        let b_j = state.bias - e_j - delta_i * k_ij - delta_j * k_jj;
        let bias_new = if alpha_i_new > 0.0 && alpha_i_new < c {
            b_i
        } else if alpha_j_new > 0.0 && alpha_j_new < c {
            b_j
        } else {
            0.5 * (b_i + b_j)
        };
        let delta_b = bias_new - state.bias;

        state.alpha[i] = alpha_i_new;
        state.alpha[j] = alpha_j_new;
        state.bias = bias_new;

        for k in 0..state.samples.len() {
            let k_ik = self.kernel_value(state, i, k);
            let k_jk = self.kernel_value(state, j, k);
            state.errors[k] += delta_i * k_ik + delta_j * k_jk + delta_b;
        }

        true
    }

    /// Average the bias implied by the free support vectors
    ///
    /// Falls back to the running bias when every multiplier sits at a bound.
    fn refine_bias(&self, state: &SolverState) -> f64 {
        let c = self.config.c;
        let (sum, count) = state
            .alpha
            .iter()
            .zip(state.errors.iter())
            .filter(|(&a, _)| a > 0.0 && a < c)
            .fold((0.0, 0usize), |(sum, count), (_, &e)| (sum + e, count + 1));

        if count > 0 {
            state.bias - sum / count as f64
        } else {
            state.bias
        }
    }
}
