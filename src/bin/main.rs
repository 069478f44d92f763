//! rdigits Command Line Interface
//!
//! Trains and evaluates digit classifiers on MNIST data stored either as
//! the four IDX distribution files or as a pair of CSV files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use rdigits::core::{ClassifierError, Result, Split};
use rdigits::data::{self, load_csv_pair, load_idx_dir, prepare, PrepareConfig, PreparedData};
use rdigits::driver::{self, c_sweep, default_svm_grid, DriverConfig, RunReport, SvmSetting};
use rdigits::kernel::{GammaPolicy, KernelChoice};
use rdigits::logistic::{MultinomialModel, OneVsAllModel};
use rdigits::persistence::load_weights;
use rdigits::Classifier;
use std::path::{Path, PathBuf};
use std::process;

const TRAIN_CSV: &str = "mnist_train.csv";
const TEST_CSV: &str = "mnist_test.csv";

#[derive(Parser)]
#[command(name = "rdigits")]
#[command(about = "Handwritten digit classification with logistic regression and SVMs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "rdigits contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train one-vs-all logistic regression, the SVM grid and multinomial
    /// logistic regression in turn
    Run(RunArgs),
    /// Train both logistic regression models only
    Logistic(LogisticArgs),
    /// Evaluate the SVM grid only
    Svm(SvmArgs),
    /// Score saved logistic regression weights on every partition
    Evaluate(EvaluateArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Directory holding the IDX files or mnist_train.csv / mnist_test.csv
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Data format
    #[arg(short, long, value_enum, default_value = "auto")]
    format: DataFormat,

    /// Number of digit classes
    #[arg(long, default_value = "10")]
    n_class: usize,

    /// Training rows per class held out for validation
    #[arg(long, default_value = "1000")]
    validation_per_class: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum DataFormat {
    /// Pick IDX or CSV from the directory contents
    Auto,
    /// train-images-idx3-ubyte and friends
    Idx,
    /// mnist_train.csv and mnist_test.csv, label first
    Csv,
}

#[derive(Args)]
struct LogisticOptions {
    /// Iteration cap of each conjugate gradient minimization
    #[arg(short, long, default_value = "100")]
    max_iterations: usize,

    /// Where the one-vs-all weights are written
    #[arg(long, default_value = "params.json")]
    params_out: PathBuf,

    /// Do not write the one-vs-all weights
    #[arg(long)]
    no_params: bool,
}

#[derive(Args)]
struct SvmOptions {
    /// Kernel to evaluate; `grid` runs the full default grid
    #[arg(long, value_enum, default_value = "grid")]
    kernel: CliKernel,

    /// RBF width: a positive number or `auto` (1 / number of features)
    #[arg(long, default_value = "auto", value_parser = parse_gamma)]
    gamma: GammaPolicy,

    /// Comma-separated regularization values; defaults to the C sweep
    #[arg(short = 'C', long, value_delimiter = ',')]
    c_values: Vec<f64>,

    /// Train each SVM on at most this many evenly strided rows
    #[arg(long)]
    sample_limit: Option<usize>,

    /// Kernel cache size in MB
    #[arg(long, default_value = "200")]
    cache_mb: usize,

    /// Fit each SVM once on the training partition and score all three,
    /// instead of fitting a fresh SVM on every partition
    #[arg(long)]
    fit_on_train: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum CliKernel {
    /// Linear, RBF gamma=0.1, RBF auto, then the C sweep with RBF auto
    Grid,
    Linear,
    Rbf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    logistic: LogisticOptions,

    #[command(flatten)]
    svm: SvmOptions,

    /// Skip one-vs-all logistic regression
    #[arg(long)]
    skip_one_vs_all: bool,

    /// Skip the SVM grid
    #[arg(long)]
    skip_svm: bool,

    /// Skip multinomial logistic regression
    #[arg(long)]
    skip_multinomial: bool,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct LogisticArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    logistic: LogisticOptions,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct SvmArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    svm: SvmOptions,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct EvaluateArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Weight matrix written by a previous run
    #[arg(short, long, default_value = "params.json")]
    params: PathBuf,

    /// Model the weights belong to
    #[arg(long, value_enum, default_value = "one-vs-all")]
    model: CliModel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum CliModel {
    OneVsAll,
    Multinomial,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Logistic(args) => logistic_command(args),
        Commands::Svm(args) => svm_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(args: RunArgs) -> Result<()> {
    let config = DriverConfig::default().with_phases(
        !args.skip_one_vs_all,
        !args.skip_svm,
        !args.skip_multinomial,
    );
    let config = apply_svm_options(apply_logistic_options(config, &args.logistic), &args.svm)?;
    let prepared = load_prepared(&args.data)?;

    let report = driver::run(&prepared, &config)?;
    finish_report(&report, args.report.as_deref())
}

fn logistic_command(args: LogisticArgs) -> Result<()> {
    let prepared = load_prepared(&args.data)?;
    let config = apply_logistic_options(
        DriverConfig::default().with_phases(true, false, true),
        &args.logistic,
    );

    let report = driver::run(&prepared, &config)?;
    finish_report(&report, args.report.as_deref())
}

fn svm_command(args: SvmArgs) -> Result<()> {
    let config = apply_svm_options(
        DriverConfig::default().with_phases(false, true, false),
        &args.svm,
    )?;
    let prepared = load_prepared(&args.data)?;

    let report = driver::run(&prepared, &config)?;
    finish_report(&report, args.report.as_deref())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    let prepared = load_prepared(&args.data)?;
    let weights = load_weights(&args.params)?;
    info!(
        "Loaded {}x{} weights from {:?}",
        weights.nrows(),
        weights.ncols(),
        args.params
    );

    if weights.ncols() != prepared.n_class {
        warn!(
            "Weights have {} class columns, data has {} classes",
            weights.ncols(),
            prepared.n_class
        );
    }

    let model: Box<dyn Classifier> = match args.model {
        CliModel::OneVsAll => Box::new(OneVsAllModel::from_weights(weights)),
        CliModel::Multinomial => Box::new(MultinomialModel::from_weights(weights)),
    };
    let accuracy = driver::evaluate_classifier(model.as_ref(), &prepared)?;

    println!("=== Evaluation Results ===");
    println!("Weights file: {:?}", args.params);
    println!("Model: {:?}", args.model);
    for split in Split::ALL {
        println!("{split} set Accuracy: {:.2}%", accuracy.get(split));
    }

    Ok(())
}

fn load_prepared(args: &DataArgs) -> Result<PreparedData> {
    let format = match args.format {
        DataFormat::Auto => detect_format(&args.data_dir)?,
        format => format,
    };
    info!("Reading {format:?} data from {:?}", args.data_dir);

    let dataset = match format {
        DataFormat::Csv => load_csv_pair(
            args.data_dir.join(TRAIN_CSV),
            args.data_dir.join(TEST_CSV),
        )?,
        _ => load_idx_dir(&args.data_dir)?,
    };

    let config = PrepareConfig::default()
        .with_n_class(args.n_class)
        .with_validation_per_class(args.validation_per_class);
    prepare(&dataset, &config)
}

fn apply_logistic_options(config: DriverConfig, options: &LogisticOptions) -> DriverConfig {
    let params_path = (!options.no_params).then(|| options.params_out.clone());
    config
        .with_max_iterations(options.max_iterations)
        .with_params_path(params_path)
}

fn apply_svm_options(config: DriverConfig, options: &SvmOptions) -> Result<DriverConfig> {
    Ok(config
        .with_svm_grid(build_grid(options.kernel, options.gamma, &options.c_values)?)
        .with_svm_sample_limit(options.sample_limit)
        .with_refit_per_split(!options.fit_on_train)
        .with_svm_cache_mb(options.cache_mb))
}

/// SVM settings for the requested kernel and C values
///
/// The default grid fixes its own C values, so explicit ones are rejected.
fn build_grid(kernel: CliKernel, gamma: GammaPolicy, c_values: &[f64]) -> Result<Vec<SvmSetting>> {
    let kernel = match kernel {
        CliKernel::Grid if !c_values.is_empty() => {
            return Err(ClassifierError::InvalidParameter(
                "--c-values needs --kernel linear or --kernel rbf".to_string(),
            ))
        }
        CliKernel::Grid => return Ok(default_svm_grid()),
        CliKernel::Linear => KernelChoice::Linear,
        CliKernel::Rbf => KernelChoice::Rbf(gamma),
    };
    let c_values = if c_values.is_empty() {
        c_sweep()
    } else {
        c_values.to_vec()
    };
    Ok(c_values
        .into_iter()
        .map(|c| SvmSetting { kernel, c })
        .collect())
}

fn parse_gamma(value: &str) -> std::result::Result<GammaPolicy, String> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(GammaPolicy::Auto);
    }
    match value.parse::<f64>() {
        Ok(gamma) if gamma > 0.0 && gamma.is_finite() => Ok(GammaPolicy::Fixed(gamma)),
        _ => Err(format!("expected a positive number or `auto`, got: {value}")),
    }
}

fn detect_format(dir: &Path) -> Result<DataFormat> {
    if dir.join(data::TRAIN_IMAGES).is_file() {
        Ok(DataFormat::Idx)
    } else if dir.join(TRAIN_CSV).is_file() {
        Ok(DataFormat::Csv)
    } else {
        Err(ClassifierError::InvalidDataset(format!(
            "No IDX or CSV training data found in {dir:?}"
        )))
    }
}

fn finish_report(report: &RunReport, path: Option<&Path>) -> Result<()> {
    if let Some(best) = report.best_svm() {
        println!(
            "\nBest SVM: kernel {} C={} ({:.2}% validation)",
            best.setting.kernel, best.setting.c, best.accuracy.validation
        );
    }
    if let Some(path) = path {
        report.save(path)?;
        info!("Wrote run report to {path:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        let dir = TempDir::new().unwrap();
        assert!(detect_format(dir.path()).is_err());

        fs::write(dir.path().join(TRAIN_CSV), "").unwrap();
        assert_eq!(detect_format(dir.path()).unwrap(), DataFormat::Csv);

        fs::write(dir.path().join(data::TRAIN_IMAGES), "").unwrap();
        assert_eq!(detect_format(dir.path()).unwrap(), DataFormat::Idx);
    }

    #[test]
    fn test_parse_gamma() {
        assert_eq!(parse_gamma("auto").unwrap(), GammaPolicy::Auto);
        assert_eq!(parse_gamma("0.1").unwrap(), GammaPolicy::Fixed(0.1));
        assert!(parse_gamma("0").is_err());
        assert!(parse_gamma("wide").is_err());
    }

    #[test]
    fn test_build_grid() {
        assert_eq!(build_grid(CliKernel::Grid, GammaPolicy::Auto, &[]).unwrap().len(), 14);

        let grid = build_grid(CliKernel::Linear, GammaPolicy::Auto, &[1.0, 10.0]).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1].kernel, KernelChoice::Linear);
        assert_eq!(grid[1].c, 10.0);

        let sweep = build_grid(CliKernel::Rbf, GammaPolicy::Fixed(0.5), &[]).unwrap();
        assert_eq!(sweep.len(), c_sweep().len());
        assert!(sweep
            .iter()
            .all(|s| s.kernel == KernelChoice::Rbf(GammaPolicy::Fixed(0.5))));
    }

    #[test]
    fn test_default_grid_rejects_explicit_c_values() {
        assert!(matches!(
            build_grid(CliKernel::Grid, GammaPolicy::Auto, &[5.0]),
            Err(ClassifierError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_svm_options_refit_unless_fit_on_train() {
        let cli = Cli::try_parse_from(["rdigits", "svm", "--kernel", "linear"]).unwrap();
        let Commands::Svm(args) = cli.command else {
            panic!("expected the svm command");
        };
        let config = apply_svm_options(DriverConfig::default(), &args.svm).unwrap();
        assert!(config.refit_per_split);

        let cli =
            Cli::try_parse_from(["rdigits", "svm", "--kernel", "linear", "--fit-on-train"]).unwrap();
        let Commands::Svm(args) = cli.command else {
            panic!("expected the svm command");
        };
        let config = apply_svm_options(DriverConfig::default(), &args.svm).unwrap();
        assert!(!config.refit_per_split);
    }

    #[test]
    fn test_cli_parses_run_options() {
        let cli = Cli::try_parse_from([
            "rdigits",
            "run",
            "--data-dir",
            "mnist",
            "--kernel",
            "rbf",
            "--gamma",
            "0.2",
            "-C",
            "1,10",
            "--skip-multinomial",
            "--no-params",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.data.data_dir, PathBuf::from("mnist"));
                assert_eq!(args.svm.c_values, vec![1.0, 10.0]);
                assert_eq!(args.svm.gamma, GammaPolicy::Fixed(0.2));
                assert!(args.skip_multinomial);
                assert!(args.logistic.no_params);
            }
            _ => panic!("expected the run command"),
        }
    }
}
