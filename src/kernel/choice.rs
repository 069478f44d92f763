//! Kernel selection at run time

use crate::core::{Result, SparseVector};
use crate::kernel::{Kernel, LinearKernel, RBFKernel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the RBF width is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GammaPolicy {
    Fixed(f64),
    /// 1 / n_features of the training data
    Auto,
}

impl GammaPolicy {
    pub fn resolve(&self, n_features: usize) -> Result<RBFKernel> {
        match *self {
            GammaPolicy::Fixed(gamma) => RBFKernel::new(gamma),
            GammaPolicy::Auto => RBFKernel::with_auto_gamma(n_features),
        }
    }
}

impl fmt::Display for GammaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GammaPolicy::Fixed(gamma) => write!(f, "{gamma}"),
            GammaPolicy::Auto => f.write_str("auto"),
        }
    }
}

/// Kernel family requested for an SVM run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelChoice {
    Linear,
    Rbf(GammaPolicy),
}

impl KernelChoice {
    /// Build the concrete kernel for data with `n_features` columns
    pub fn build(&self, n_features: usize) -> Result<SvmKernel> {
        match self {
            KernelChoice::Linear => Ok(SvmKernel::Linear(LinearKernel::new())),
            KernelChoice::Rbf(policy) => policy.resolve(n_features).map(SvmKernel::Rbf),
        }
    }
}

impl fmt::Display for KernelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelChoice::Linear => f.write_str("linear"),
            KernelChoice::Rbf(policy) => write!(f, "rbf(gamma={policy})"),
        }
    }
}

/// A resolved kernel
#[derive(Debug, Clone, Copy)]
pub enum SvmKernel {
    Linear(LinearKernel),
    Rbf(RBFKernel),
}

impl Kernel for SvmKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        match self {
            SvmKernel::Linear(k) => k.compute(x, y),
            SvmKernel::Rbf(k) => k.compute(x, y),
        }
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        match self {
            SvmKernel::Linear(k) => k.compute_with_norms(x, y, x_norm_sq, y_norm_sq),
            SvmKernel::Rbf(k) => k.compute_with_norms(x, y, x_norm_sq, y_norm_sq),
        }
    }
}
