//! Kernel trait definition

use crate::core::SparseVector;

/// Kernel function K(x, y) over sparse samples
///
/// Implementations must be symmetric; the kernel cache stores one value per
/// unordered pair.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Compute K(x, y) given the squared norms of both vectors
    ///
    /// The solver precomputes norms once per sample, which lets distance-based
    /// kernels skip the full distance merge.
    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        let _ = (x_norm_sq, y_norm_sq);
        self.compute(x, y)
    }
}
