//! RBF kernel: K(x, y) = exp(-γ ||x - y||²)

use crate::core::{ClassifierError, Result, SparseVector};
use crate::kernel::linear::dot_product_sparse;
use crate::kernel::Kernel;

/// Gaussian radial basis function kernel
#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Create a kernel with the given width; gamma must be positive
    pub fn new(gamma: f64) -> Result<Self> {
        if !(gamma > 0.0 && gamma.is_finite()) {
            return Err(ClassifierError::InvalidParameter(format!(
                "Gamma must be positive, got: {gamma}"
            )));
        }
        Ok(Self { gamma })
    }

    /// Create a kernel with gamma = 1 / n_features
    pub fn with_auto_gamma(n_features: usize) -> Result<Self> {
        if n_features == 0 {
            return Err(ClassifierError::InvalidParameter(
                "Number of features must be positive".to_string(),
            ));
        }
        Self::new(1.0 / n_features as f64)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-self.gamma * squared_distance(x, y)).exp()
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        // ||x - y||² = ||x||² + ||y||² - 2 x·y, clamped against rounding
        let distance = (x_norm_sq + y_norm_sq - 2.0 * dot_product_sparse(x, y)).max(0.0);
        (-self.gamma * distance).exp()
    }
}

/// Squared Euclidean distance between two sparse vectors
fn squared_distance(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut distance_sq = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            let diff = x.values[i] - y.values[j];
            distance_sq += diff * diff;
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            distance_sq += x.values[i] * x.values[i];
            i += 1;
        } else {
            distance_sq += y.values[j] * y.values[j];
            j += 1;
        }
    }

    distance_sq += x.values[i..].iter().map(|v| v * v).sum::<f64>();
    distance_sq += y.values[j..].iter().map(|v| v * v).sum::<f64>();
    distance_sq
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rbf_kernel_creation() {
        assert_eq!(RBFKernel::new(0.5).unwrap().gamma(), 0.5);
        assert_eq!(RBFKernel::with_auto_gamma(10).unwrap().gamma(), 0.1);
    }

    #[test]
    fn test_rbf_kernel_invalid_gamma() {
        assert!(RBFKernel::new(-0.5).is_err());
        assert!(RBFKernel::new(0.0).is_err());
        assert!(RBFKernel::new(f64::NAN).is_err());
        assert!(RBFKernel::with_auto_gamma(0).is_err());
    }

    #[test]
    fn test_rbf_kernel_identical_vectors() {
        let kernel = RBFKernel::new(1.0).unwrap();
        let x = SparseVector::new(vec![0, 1, 2], vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(kernel.compute(&x, &x), 1.0);
    }

    #[test]
    fn test_rbf_kernel_disjoint_support() {
        let kernel = RBFKernel::new(1.0).unwrap();
        let x = SparseVector::new(vec![0, 2], vec![1.0, 1.0]);
        let y = SparseVector::new(vec![1, 3], vec![1.0, 1.0]);

        assert_relative_eq!(kernel.compute(&x, &y), (-4.0_f64).exp());
    }

    #[test]
    fn test_rbf_kernel_with_norms_agrees() {
        let kernel = RBFKernel::new(2.0).unwrap();
        let x = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        let y = SparseVector::new(vec![1, 5], vec![1.0, 2.0]);

        let direct = kernel.compute(&x, &y);
        let with_norms = kernel.compute_with_norms(&x, &y, x.norm_squared(), y.norm_squared());
        assert_relative_eq!(direct, with_norms, epsilon = 1e-12);
    }

    #[test]
    fn test_squared_distance() {
        let x = SparseVector::new(vec![0, 2, 5], vec![1.0, 3.0, 2.0]);
        let y = SparseVector::new(vec![2, 3, 5], vec![2.0, 1.0, 4.0]);

        // 1 + 1 + 1 + 4
        assert_eq!(squared_distance(&x, &y), 7.0);
        assert_eq!(squared_distance(&x, &x), 0.0);
        assert_eq!(squared_distance(&SparseVector::empty(), &y), 21.0);
    }

    #[test]
    fn test_rbf_kernel_decreases_with_distance() {
        let kernel = RBFKernel::new(1.0).unwrap();
        let x = SparseVector::empty();
        let values: Vec<f64> = [1.0, 2.0, 3.0]
            .iter()
            .map(|&v| kernel.compute(&x, &SparseVector::new(vec![0], vec![v])))
            .collect();

        assert!(values[0] > values[1] && values[1] > values[2]);
        assert!(values.iter().all(|&k| (0.0..=1.0).contains(&k)));
    }
}
