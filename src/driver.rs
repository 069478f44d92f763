//! End-to-end training runs
//!
//! One run trains the one-vs-all logistic model and dumps its weights,
//! evaluates an SVM configuration grid, then trains the multinomial model.
//! Accuracies and timings are printed as each phase finishes and collected
//! into a [`RunReport`].

use crate::api::{evaluate_svm, SVC};
use crate::core::{Classifier, ClassifierError, Result, Split, SplitAccuracy};
use crate::data::PreparedData;
use crate::kernel::{GammaPolicy, KernelChoice};
use crate::logistic::{train_multinomial, train_one_vs_all, OneVsAllModel};
use crate::minimize::ConjugateGradient;
use crate::persistence::save_weights;
use crate::utils::accuracy_percent;
use crate::utils::memory::recommend_cache_size;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One SVM configuration of the evaluation grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmSetting {
    pub kernel: KernelChoice,
    pub c: f64,
}

/// Linear, RBF γ=0.1, RBF auto, then RBF auto over C ∈ {1, 10, 20, …, 100}
pub fn default_svm_grid() -> Vec<SvmSetting> {
    let mut grid = vec![
        SvmSetting {
            kernel: KernelChoice::Linear,
            c: 1.0,
        },
        SvmSetting {
            kernel: KernelChoice::Rbf(GammaPolicy::Fixed(0.1)),
            c: 1.0,
        },
        SvmSetting {
            kernel: KernelChoice::Rbf(GammaPolicy::Auto),
            c: 1.0,
        },
    ];
    grid.extend(c_sweep().into_iter().map(|c| SvmSetting {
        kernel: KernelChoice::Rbf(GammaPolicy::Auto),
        c,
    }));
    grid
}

/// C values of the regularization sweep
pub fn c_sweep() -> Vec<f64> {
    std::iter::once(1.0)
        .chain((1..=10).map(|k| 10.0 * k as f64))
        .collect()
}

/// Configuration of a full run
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Iteration cap of every conjugate gradient minimization
    pub max_iterations: usize,
    pub gtol: f64,
    /// Where the one-vs-all weights are written; `None` skips the dump
    pub params_path: Option<PathBuf>,
    pub run_one_vs_all: bool,
    pub run_svm: bool,
    pub run_multinomial: bool,
    pub svm_grid: Vec<SvmSetting>,
    /// Train each SVM on at most this many rows
    pub svm_sample_limit: Option<usize>,
    /// Memory available to the SVM kernel cache, in MiB
    pub svm_cache_mb: usize,
    /// Fit a fresh SVM on each partition and score it on that partition;
    /// when false, fit once on the training partition and score all three
    pub refit_per_split: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            gtol: 1e-5,
            params_path: Some(PathBuf::from("params.json")),
            run_one_vs_all: true,
            run_svm: true,
            run_multinomial: true,
            svm_grid: default_svm_grid(),
            svm_sample_limit: None,
            svm_cache_mb: 200,
            refit_per_split: true,
        }
    }
}

impl DriverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_params_path(mut self, path: Option<PathBuf>) -> Self {
        self.params_path = path;
        self
    }

    pub fn with_svm_grid(mut self, grid: Vec<SvmSetting>) -> Self {
        self.svm_grid = grid;
        self
    }

    pub fn with_svm_sample_limit(mut self, limit: Option<usize>) -> Self {
        self.svm_sample_limit = limit;
        self
    }

    pub fn with_svm_cache_mb(mut self, cache_mb: usize) -> Self {
        self.svm_cache_mb = cache_mb;
        self
    }

    pub fn with_refit_per_split(mut self, refit: bool) -> Self {
        self.refit_per_split = refit;
        self
    }

    /// Enable or disable the three phases
    pub fn with_phases(mut self, one_vs_all: bool, svm: bool, multinomial: bool) -> Self {
        self.run_one_vs_all = one_vs_all;
        self.run_svm = svm;
        self.run_multinomial = multinomial;
        self
    }

    fn minimizer(&self) -> ConjugateGradient {
        ConjugateGradient::new(self.max_iterations, self.gtol)
    }
}

/// Accuracy and timing of one logistic model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseReport {
    pub accuracy: SplitAccuracy,
    pub training_time: Duration,
    pub total_time: Duration,
}

/// Accuracy of one SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmReport {
    pub setting: SvmSetting,
    pub accuracy: SplitAccuracy,
    pub elapsed: Duration,
}

/// Everything a run measured
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub n_features: usize,
    pub n_train: usize,
    pub n_validation: usize,
    pub n_test: usize,
    pub one_vs_all: Option<PhaseReport>,
    pub svm: Vec<SvmReport>,
    pub multinomial: Option<PhaseReport>,
}

impl RunReport {
    fn new(prepared: &PreparedData) -> Self {
        Self {
            started_at: Utc::now(),
            n_features: prepared.n_features(),
            n_train: prepared.train.len(),
            n_validation: prepared.validation.len(),
            n_test: prepared.test.len(),
            one_vs_all: None,
            svm: Vec::new(),
            multinomial: None,
        }
    }

    /// SVM configuration with the best validation accuracy
    pub fn best_svm(&self) -> Option<&SvmReport> {
        self.svm
            .iter()
            .max_by(|a, b| a.accuracy.validation.total_cmp(&b.accuracy.validation))
    }

    /// Write the report as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| ClassifierError::SerializationError(e.to_string()))
    }
}

/// Run every enabled phase on prepared data
pub fn run(prepared: &PreparedData, config: &DriverConfig) -> Result<RunReport> {
    let mut report = RunReport::new(prepared);
    info!(
        "Run on {} features: {} train, {} validation, {} test samples",
        report.n_features, report.n_train, report.n_validation, report.n_test
    );

    if config.run_one_vs_all {
        let (_, phase) = run_one_vs_all(prepared, config)?;
        report.one_vs_all = Some(phase);
    }
    if config.run_svm {
        report.svm = run_svm_grid(prepared, config)?;
    }
    if config.run_multinomial {
        report.multinomial = Some(run_multinomial(prepared, config)?);
    }

    Ok(report)
}

/// Train the one-vs-all model, dump its weights and score it
pub fn run_one_vs_all(
    prepared: &PreparedData,
    config: &DriverConfig,
) -> Result<(OneVsAllModel, PhaseReport)> {
    println!("Logistic Regression with Gradient Descent");
    let start = Instant::now();

    let model = train_one_vs_all(
        prepared.train.data.view(),
        prepared.train.labels.view(),
        prepared.n_class,
        &config.minimizer(),
    )?;
    let training_time = start.elapsed();

    if let Some(path) = &config.params_path {
        save_weights(path, model.weights())?;
        info!("Wrote one-vs-all weights to {}", path.display());
    }

    let accuracy = evaluate_classifier(&model, prepared)?;
    print_accuracy(&accuracy);
    let total_time = start.elapsed();
    println!("\n Blr time: {:.3}s", total_time.as_secs_f64());

    Ok((
        model,
        PhaseReport {
            accuracy,
            training_time,
            total_time,
        },
    ))
}

/// Train the multinomial model and score it
pub fn run_multinomial(prepared: &PreparedData, config: &DriverConfig) -> Result<PhaseReport> {
    println!("Multinomial Logistic Regression");
    let start = Instant::now();

    let model = train_multinomial(
        prepared.train.data.view(),
        prepared.train.labels.view(),
        prepared.n_class,
        &config.minimizer(),
    )?;
    let training_time = start.elapsed();

    let accuracy = evaluate_classifier(&model, prepared)?;
    print_accuracy(&accuracy);
    let total_time = start.elapsed();
    println!("\n Mlr time: {:.3}s", total_time.as_secs_f64());

    Ok(PhaseReport {
        accuracy,
        training_time,
        total_time,
    })
}

/// Score every configuration of the SVM grid on all three partitions
pub fn run_svm_grid(prepared: &PreparedData, config: &DriverConfig) -> Result<Vec<SvmReport>> {
    let cache_bytes = recommend_cache_size(
        config.svm_sample_limit.unwrap_or(prepared.train.len()),
        config.svm_cache_mb,
    );

    let mut reports = Vec::with_capacity(config.svm_grid.len());
    for setting in &config.svm_grid {
        println!("\n\n--------------SVM-------------------\n");
        println!("Kernel {} C={}", setting.kernel, setting.c);

        let svc = SVC::new(setting.kernel)
            .with_c(setting.c)
            .with_cache_size(cache_bytes)
            .with_sample_limit(config.svm_sample_limit);

        let start = Instant::now();
        let accuracy = if config.refit_per_split {
            svm_accuracy_refit(&svc, prepared)?
        } else {
            svm_accuracy(&svc, prepared)?
        };
        let elapsed = start.elapsed();

        print_accuracy(&accuracy);
        println!(" SVM time: {:.3}s", elapsed.as_secs_f64());
        reports.push(SvmReport {
            setting: *setting,
            accuracy,
            elapsed,
        });
    }

    Ok(reports)
}

/// Fit once on the training partition, score every partition
fn svm_accuracy(svc: &SVC, prepared: &PreparedData) -> Result<SplitAccuracy> {
    let model = svc.fit(prepared.train.data.view(), prepared.train.labels.view())?;
    evaluate_classifier(&model, prepared)
}

/// Fit on each partition and score it on itself
fn svm_accuracy_refit(svc: &SVC, prepared: &PreparedData) -> Result<SplitAccuracy> {
    let mut accuracy = SplitAccuracy::default();
    for split in Split::ALL {
        let data = prepared.split(split);
        accuracy.set(split, evaluate_svm(svc, data, data)?);
    }
    Ok(accuracy)
}

/// Percentage accuracy of `model` on every partition
pub fn evaluate_classifier<C: Classifier + ?Sized>(
    model: &C,
    prepared: &PreparedData,
) -> Result<SplitAccuracy> {
    let mut accuracy = SplitAccuracy::default();
    for split in Split::ALL {
        let data = prepared.split(split);
        let predicted = model.predict(data.data.view())?;
        accuracy.set(split, accuracy_percent(predicted.view(), data.labels.view())?);
    }
    Ok(accuracy)
}

fn print_accuracy(accuracy: &SplitAccuracy) {
    for split in Split::ALL {
        println!("\n {split} set Accuracy: {:.2}%", accuracy.get(split));
    }
}
