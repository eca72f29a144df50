use serde::Serialize;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{info, warn};

use crate::{
    dataset::idx::MnistEntry,
    error::NetworkError,
    network::network::Network,
    train::train_config::TrainConfig,
};

/// Outcome of one pass of online training.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    /// Samples that produced a parameter update.
    pub samples_seen: usize,
    /// Samples whose label did not fit the output layer.
    pub skipped: usize,
    /// True when the stop flag ended the pass early.
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

/// Accuracy of a network over a labelled set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
}

impl Evaluation {
    /// Fraction correct in `[0, 1]`; `0` for an empty set.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Trains `network` on `entries` one sample at a time, in order.
///
/// The network must already be initialized; `config.seed` is not read
/// here (see `train_from_scratch`). Shape errors abort the pass and are
/// returned unchanged.
pub fn train_network(
    network: &mut Network,
    entries: &[MnistEntry],
    config: &TrainConfig,
) -> Result<TrainReport, NetworkError> {
    let t_start = Instant::now();
    let classes = network.output_size();
    let total = config.limit.map_or(entries.len(), |l| l.min(entries.len()));

    let mut report = TrainReport {
        samples_seen: 0,
        skipped: 0,
        cancelled: false,
        elapsed_ms: 0,
    };
    let mut nan_reported = false;

    for (i, entry) in entries.iter().take(total).enumerate() {
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                warn!(sample = i, total, "training cancelled");
                report.cancelled = true;
                break;
            }
        }

        let Some(target) = entry.one_hot(classes) else {
            warn!(sample = i, label = entry.label, classes, "label out of range, skipping sample");
            report.skipped += 1;
            continue;
        };

        network.train(&entry.input(), &target)?;
        report.samples_seen += 1;

        if config.check_nan && !nan_reported {
            let last = network.layers().len() - 1;
            let (weights, biases) = network.layers()[last].params(last)?;
            if weights.any_nan() || biases.any_nan() {
                warn!(sample = i, "output layer parameters contain NaN");
                nan_reported = true;
            }
        }

        if config.log_every > 0 && (i + 1) % config.log_every == 0 {
            info!(sample = i + 1, total, "training progress");
        }
    }

    report.elapsed_ms = t_start.elapsed().as_millis() as u64;
    info!(
        samples = report.samples_seen,
        skipped = report.skipped,
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed_ms,
        "training pass finished"
    );
    Ok(report)
}

/// Initializes `network` from `config.rng()`, then runs `train_network`.
///
/// Any parameters already in the network are replaced, so a seeded config
/// reproduces the whole run.
pub fn train_from_scratch(
    network: &mut Network,
    entries: &[MnistEntry],
    config: &TrainConfig,
) -> Result<TrainReport, NetworkError> {
    network.randomize_params_with(&mut config.rng());
    train_network(network, entries, config)
}

/// Counts the samples whose predicted class matches the label.
pub fn evaluate(network: &Network, entries: &[MnistEntry]) -> Result<Evaluation, NetworkError> {
    let mut correct = 0;
    for entry in entries {
        let output = network.run(&entry.input())?;
        if output.argmax() == entry.label as usize {
            correct += 1;
        }
    }
    let eval = Evaluation { correct, total: entries.len() };
    info!(correct, total = eval.total, accuracy = eval.accuracy(), "evaluation finished");
    Ok(eval)
}
