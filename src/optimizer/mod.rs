//! Binary SVM training
//!
//! Ties a kernel to the SMO solver and turns the solver's multipliers into a
//! model that only keeps its support vectors.

use crate::core::{OptimizationResult, Prediction, Result, SVMModel, Sample, SolverConfig, SparseVector};
use crate::kernel::Kernel;
use crate::solver::SMOSolver;
use std::sync::Arc;

/// Trainer for binary (±1) SVMs
pub struct SVMOptimizer<K: Kernel> {
    kernel: Arc<K>,
    config: SolverConfig,
}

impl<K: Kernel> SVMOptimizer<K> {
    pub fn new(kernel: Arc<K>, config: SolverConfig) -> Self {
        Self { kernel, config }
    }

    pub fn with_kernel(kernel: K) -> Self {
        Self::new(Arc::new(kernel), SolverConfig::default())
    }

    /// Train on samples labeled +1 / -1
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedSVM<K>> {
        let solver = SMOSolver::new(Arc::clone(&self.kernel), self.config.clone());
        let result = solver.solve(samples)?;
        Ok(TrainedSVM::new(Arc::clone(&self.kernel), samples, result))
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

/// A trained binary SVM
pub struct TrainedSVM<K: Kernel> {
    kernel: Arc<K>,
    support_vectors: Vec<SparseVector>,
    support_norms: Vec<f64>,
    /// α_i y_i per support vector
    coefficients: Vec<f64>,
    bias: f64,
    support_indices: Vec<usize>,
}

impl<K: Kernel> TrainedSVM<K> {
    pub(crate) fn new(kernel: Arc<K>, samples: &[Sample], result: OptimizationResult) -> Self {
        let support_vectors: Vec<SparseVector> = result
            .support_vectors
            .iter()
            .map(|&i| samples[i].features.clone())
            .collect();
        let support_norms = support_vectors.iter().map(|sv| sv.norm_squared()).collect();
        let coefficients = result
            .support_vectors
            .iter()
            .map(|&i| result.alpha[i] * samples[i].label)
            .collect();

        Self {
            kernel,
            support_vectors,
            support_norms,
            coefficients,
            bias: result.b,
            support_indices: result.support_vectors,
        }
    }

    /// Signed distance-like score of `x`; positive means the +1 class
    pub fn decision_function(&self, x: &SparseVector) -> f64 {
        let x_norm = x.norm_squared();
        self.support_vectors
            .iter()
            .zip(self.support_norms.iter())
            .zip(self.coefficients.iter())
            .map(|((sv, &sv_norm), &coef)| {
                coef * self.kernel.compute_with_norms(sv, x, sv_norm, x_norm)
            })
            .sum::<f64>()
            + self.bias
    }

    pub fn support_vectors(&self) -> &[SparseVector] {
        &self.support_vectors
    }

    /// α_i y_i for each support vector
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Indices of the support vectors in the training slice
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }
}

impl<K: Kernel> SVMModel for TrainedSVM<K> {
    fn predict(&self, sample: &Sample) -> Prediction {
        let decision_value = self.decision_function(&sample.features);
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
