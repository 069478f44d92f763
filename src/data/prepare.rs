//! Partitioning, feature pruning and rescaling
//!
//! Turns a class-keyed [`DigitDataset`] into train / validation / test
//! partitions that share one feature space.

use crate::core::{ClassifierError, Result};
use crate::data::{DigitDataset, LabeledSplit, PreparedData};
use log::{debug, info, warn};
use ndarray::{concatenate, s, Array1, Array2, ArrayView2, Axis};

/// Configuration for [`prepare`]
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    /// Number of classes; blocks `0..n_class` must all be present
    pub n_class: usize,
    /// Rows reserved for validation from the front of each training block
    pub validation_per_class: usize,
    /// Features whose training standard deviation is at or below this are dropped
    pub std_threshold: f64,
    /// Every intensity is divided by this after pruning
    pub intensity_scale: f64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            n_class: 10,
            validation_per_class: 1000,
            std_threshold: 0.001,
            intensity_scale: 255.0,
        }
    }
}

impl PrepareConfig {
    /// Set the number of validation rows per class
    pub fn with_validation_per_class(mut self, n: usize) -> Self {
        self.validation_per_class = n;
        self
    }

    /// Set the number of classes
    pub fn with_n_class(mut self, n_class: usize) -> Self {
        self.n_class = n_class;
        self
    }
}

/// Split, prune and rescale a class-keyed dataset
///
/// The feature count is taken from the class-0 training block. The first
/// `validation_per_class` rows of every class become validation data, the
/// rest training data; test blocks are concatenated as-is. All three
/// partitions keep the same columns: those whose population standard
/// deviation over the training partition exceeds `std_threshold`.
pub fn prepare(dataset: &DigitDataset, config: &PrepareConfig) -> Result<PreparedData> {
    if config.n_class == 0 {
        return Err(ClassifierError::InvalidParameter(
            "Number of classes must be positive".to_string(),
        ));
    }
    if config.intensity_scale <= 0.0 {
        return Err(ClassifierError::InvalidParameter(format!(
            "Intensity scale must be positive, got: {}",
            config.intensity_scale
        )));
    }

    if let Some(extra) = dataset.classes().find(|&c| c >= config.n_class) {
        warn!(
            "Dataset contains class {extra} outside 0..{}; it will be ignored",
            config.n_class
        );
    }

    let n_features = dataset.train_block(0)?.ncols();
    let n_validation = config.validation_per_class;

    let mut train_views = Vec::with_capacity(config.n_class);
    let mut validation_views = Vec::with_capacity(config.n_class);
    let mut test_views = Vec::with_capacity(config.n_class);
    let mut train_labels = Vec::new();
    let mut validation_labels = Vec::new();
    let mut test_labels = Vec::new();

    for class in 0..config.n_class {
        let block = dataset.train_block(class)?;
        check_width(block.view(), n_features)?;

        if block.nrows() < n_validation {
            return Err(ClassifierError::InvalidDataset(format!(
                "Class {class} has {} training rows, fewer than the {n_validation} reserved for validation",
                block.nrows()
            )));
        }

        validation_views.push(block.slice(s![..n_validation, ..]));
        train_views.push(block.slice(s![n_validation.., ..]));
        validation_labels.extend(std::iter::repeat(class).take(n_validation));
        train_labels.extend(std::iter::repeat(class).take(block.nrows() - n_validation));

        let test_block = dataset.test_block(class)?;
        check_width(test_block.view(), n_features)?;
        test_views.push(test_block.view());
        test_labels.extend(std::iter::repeat(class).take(test_block.nrows()));

        debug!(
            "Class {class}: {} train, {n_validation} validation, {} test rows",
            block.nrows() - n_validation,
            test_block.nrows()
        );
    }

    let train_data = stack(&train_views)?;
    let validation_data = stack(&validation_views)?;
    let test_data = stack(&test_views)?;

    if train_data.nrows() == 0 {
        return Err(ClassifierError::EmptyDataset);
    }

    let kept_features = informative_features(train_data.view(), config.std_threshold);
    info!(
        "Keeping {} of {n_features} features (std > {})",
        kept_features.len(),
        config.std_threshold
    );

    let finish = |data: Array2<f64>, labels: Vec<usize>| -> Result<LabeledSplit> {
        let mut pruned = data.select(Axis(1), &kept_features);
        pruned /= config.intensity_scale;
        LabeledSplit::new(pruned, Array1::from(labels))
    };

    let train = finish(train_data, train_labels)?;
    let validation = finish(validation_data, validation_labels)?;
    let test = finish(test_data, test_labels)?;

    let prepared = PreparedData {
        train,
        validation,
        test,
        kept_features,
        n_class: config.n_class,
    };

    info!(
        "Prepared {} train, {} validation, {} test samples",
        prepared.train.len(),
        prepared.validation.len(),
        prepared.test.len()
    );
    Ok(prepared)
}

/// Column indices whose population standard deviation exceeds `threshold`
pub fn informative_features(data: ArrayView2<f64>, threshold: f64) -> Vec<usize> {
    data.std_axis(Axis(0), 0.0)
        .iter()
        .enumerate()
        .filter(|(_, &sigma)| sigma > threshold)
        .map(|(i, _)| i)
        .collect()
}

fn check_width(block: ArrayView2<f64>, n_features: usize) -> Result<()> {
    if block.ncols() != n_features {
        return Err(ClassifierError::DimensionMismatch {
            expected: n_features,
            actual: block.ncols(),
        });
    }
    Ok(())
}

fn stack(views: &[ArrayView2<f64>]) -> Result<Array2<f64>> {
    concatenate(Axis(0), views).map_err(|e| ClassifierError::InvalidDataset(e.to_string()))
}
