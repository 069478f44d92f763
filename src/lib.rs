//! Handwritten digit classification
//!
//! Three classifier families trained on MNIST-style data:
//! - one-vs-all and multinomial logistic regression, minimized with
//!   nonlinear conjugate gradient
//! - one-vs-one Support Vector Machines trained with Platt's SMO
//!
//! The [`driver`] module ties them together into a single run that reports
//! training, validation and test accuracy for each model.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod driver;
pub mod kernel;
pub mod logistic;
pub mod minimize;
pub mod multiclass;
pub mod optimizer;
pub mod persistence;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{FittedSVC, SVC};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{ClassifierError, Result};
pub use crate::data::{DigitDataset, LabeledSplit, PrepareConfig, PreparedData};
pub use crate::driver::{DriverConfig, RunReport};
pub use crate::kernel::{GammaPolicy, Kernel, KernelChoice, LinearKernel, RBFKernel};
pub use crate::logistic::{MultinomialModel, OneVsAllModel};
pub use crate::minimize::{ConjugateGradient, MinimizeResult};
pub use crate::optimizer::{SVMOptimizer, TrainedSVM};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
