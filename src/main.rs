//! digit-nn CLI: train the digit classifier on an IDX dataset directory and
//! report its test accuracy.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use digit_nn::{
    decode_mnist_from_dir, evaluate, train_from_scratch, NetworkSpec, Split, TrainConfig,
};

#[derive(Parser)]
#[command(name = "digit-nn")]
#[command(about = "Train a from-scratch handwritten digit classifier")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on <data>/train_* and evaluate on <data>/test_*
    Train {
        /// Directory holding train_images, train_labels, test_images, test_labels
        #[arg(short, long, env = "DIGIT_NN_DATA")]
        data: PathBuf,

        /// Network spec (JSON); defaults to 784 -> hidden ReLU -> 10 softmax
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Hidden layer size when no spec file is given
        #[arg(long, default_value = "10")]
        hidden: usize,

        /// Maximum training samples
        #[arg(long)]
        limit: Option<usize>,

        /// Maximum test samples
        #[arg(long)]
        test_limit: Option<usize>,

        /// Random seed for reproducible initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Warn when the output layer turns NaN
        #[arg(long)]
        check_nan: bool,
    },

    /// Write the default network spec as JSON
    InitSpec {
        /// Output file
        path: PathBuf,

        /// Hidden layer size
        #[arg(long, default_value = "10")]
        hidden: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train { data, spec, hidden, limit, test_limit, seed, check_nan } => {
            let spec = match spec {
                Some(path) => NetworkSpec::load_json(&path.to_string_lossy())
                    .with_context(|| format!("loading spec {}", path.display()))?,
                None => NetworkSpec::single_hidden(hidden),
            };
            let config = TrainConfig::new()
                .with_limit(limit)
                .with_seed(seed)
                .with_nan_check(check_nan);
            run_train(&data, &spec, &config, test_limit)
        }
        Commands::InitSpec { path, hidden } => {
            NetworkSpec::single_hidden(hidden)
                .save_json(&path.to_string_lossy())
                .with_context(|| format!("writing spec {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn run_train(
    data: &Path,
    spec: &NetworkSpec,
    config: &TrainConfig,
    test_limit: Option<usize>,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;

    let mut network = spec.build()?;

    let train_set = runtime
        .block_on(decode_mnist_from_dir(data, Split::Train, config.limit))
        .context("reading training data")?;
    if train_set.is_empty() {
        bail!("training data in {} could not be decoded", data.display());
    }

    info!(samples = train_set.len(), layers = spec.layers.len(), "training");
    let report = train_from_scratch(&mut network, &train_set, config)?;

    let test_set = runtime
        .block_on(decode_mnist_from_dir(data, Split::Test, test_limit))
        .context("reading test data")?;
    if test_set.is_empty() {
        bail!("test data in {} could not be decoded", data.display());
    }

    let eval = evaluate(&network, &test_set)?;
    println!(
        "Trained on {} samples in {} ms; tested accuracy: {:.1}% ({}/{})",
        report.samples_seen,
        report.elapsed_ms,
        eval.accuracy() * 100.0,
        eval.correct,
        eval.total,
    );
    Ok(())
}
