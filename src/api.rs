//! High-level SVM interface over dense digit matrices
//!
//! ```rust,no_run
//! use rdigits::api::SVC;
//! use rdigits::kernel::{GammaPolicy, KernelChoice};
//! # use ndarray::{Array1, Array2};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let (data, labels) = (Array2::<f64>::zeros((2, 3)), Array1::from(vec![0usize, 1]));
//! let model = SVC::new(KernelChoice::Rbf(GammaPolicy::Auto))
//!     .with_c(10.0)
//!     .fit(data.view(), labels.view())?;
//! let predicted = model.predict_rows(data.view())?;
//! # Ok(())
//! # }
//! ```

use crate::core::{Classifier, ClassifierError, Result, SolverConfig, SparseVector};
use crate::data::LabeledSplit;
use crate::kernel::{KernelChoice, SvmKernel};
use crate::multiclass::OneVsOneSVM;
use crate::utils::{accuracy_percent, class_counts, strided_indices};
use log::{debug, info};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use std::sync::Arc;
use std::time::Instant;

/// Multi-class support vector classifier, configured builder-style
#[derive(Debug, Clone)]
pub struct SVC {
    kernel: KernelChoice,
    config: SolverConfig,
    sample_limit: Option<usize>,
}

impl SVC {
    pub fn new(kernel: KernelChoice) -> Self {
        Self {
            kernel,
            config: SolverConfig::default(),
            sample_limit: None,
        }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set KKT tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set the cap on solver passes
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    /// Train on at most `limit` rows, taken at an even stride
    pub fn with_sample_limit(mut self, limit: Option<usize>) -> Self {
        self.sample_limit = limit;
        self
    }

    pub fn kernel(&self) -> KernelChoice {
        self.kernel
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Fit on N×D `data` with one class label per row
    pub fn fit(&self, data: ArrayView2<f64>, labels: ArrayView1<usize>) -> Result<FittedSVC> {
        if data.nrows() != labels.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: data.nrows(),
                actual: labels.len(),
            });
        }
        if data.nrows() == 0 {
            return Err(ClassifierError::EmptyDataset);
        }

        let n_features = data.ncols();
        let kernel = self.kernel.build(n_features)?;

        let indices = match self.sample_limit {
            Some(limit) => strided_indices(data.nrows(), limit),
            None => (0..data.nrows()).collect(),
        };
        if indices.len() < data.nrows() {
            debug!("Sub-sampling {} of {} rows", indices.len(), data.nrows());
        }

        let rows: Vec<SparseVector> = indices
            .iter()
            .map(|&i| SparseVector::from_dense(data.row(i)))
            .collect();
        let row_labels: Vec<usize> = indices.iter().map(|&i| labels[i]).collect();
        debug!("Class counts: {:?}", class_counts(ArrayView1::from(row_labels.as_slice())));

        let model = OneVsOneSVM::train(Arc::new(kernel), &self.config, &rows, &row_labels)?;
        Ok(FittedSVC { model, n_features })
    }
}

/// A fitted [`SVC`]
pub struct FittedSVC {
    model: OneVsOneSVM<SvmKernel>,
    n_features: usize,
}

impl FittedSVC {
    /// Predict one label per row
    pub fn predict_rows(&self, data: ArrayView2<f64>) -> Result<Array1<usize>> {
        if data.ncols() != self.n_features {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.n_features,
                actual: data.ncols(),
            });
        }
        Ok(data
            .axis_iter(Axis(0))
            .map(|row| self.model.predict_one(&SparseVector::from_dense(row)))
            .collect())
    }

    pub fn classes(&self) -> &[usize] {
        self.model.classes()
    }

    pub fn n_support_vectors(&self) -> usize {
        self.model.n_support_vectors()
    }
}

impl Classifier for FittedSVC {
    fn predict(&self, data: ArrayView2<f64>) -> Result<Array1<usize>> {
        self.predict_rows(data)
    }
}

/// Fit `svc` on `fit_split` and return its percentage accuracy on `eval_split`
pub fn evaluate_svm(svc: &SVC, fit_split: &LabeledSplit, eval_split: &LabeledSplit) -> Result<f64> {
    let start = Instant::now();
    let model = svc.fit(fit_split.data.view(), fit_split.labels.view())?;
    let predicted = model.predict(eval_split.data.view())?;
    let accuracy = accuracy_percent(predicted.view(), eval_split.labels.view())?;
    info!(
        "SVM {} C={}: {:.2}% ({} support vectors, {:.2?})",
        svc.kernel(),
        svc.config().c,
        accuracy,
        model.n_support_vectors(),
        start.elapsed()
    );
    Ok(accuracy)
}
