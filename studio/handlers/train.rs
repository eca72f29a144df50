use std::panic::{self, AssertUnwindSafe};
use std::sync::{atomic::{AtomicBool, Ordering}, Arc};
use std::thread;

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use tiny_http::Request;
use tracing::{error, info};

use digit_nn::{
    decode_mnist_from_dir, evaluate, train_from_scratch, Network, NetworkSpec, Split,
    TrainConfig,
};

use crate::routes::{json_error, json_response, read_body, HttpResponse};
use crate::state::{SharedState, StudioSettings, TrainingStatus};

/// Hidden layer sizes accepted from clients.
pub const HIDDEN_RANGE: std::ops::RangeInclusive<usize> = 1..=200;

#[derive(Deserialize, Default)]
struct TrainRequest {
    hidden: Option<usize>,
}

#[derive(Serialize)]
struct TrainAccepted {
    run: u64,
    hidden: usize,
}

// ---------------------------------------------------------------------------
// POST /train
// ---------------------------------------------------------------------------

pub fn handle_start(request: &mut Request, state: SharedState) -> HttpResponse {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    let req: TrainRequest = if body.trim().is_empty() {
        TrainRequest::default()
    } else {
        match serde_json::from_str(&body) {
            Ok(req) => req,
            Err(e) => return json_error(400, &format!("invalid request body: {}", e)),
        }
    };

    let hidden = req.hidden.unwrap_or_else(|| state.lock().unwrap().hidden);
    if !HIDDEN_RANGE.contains(&hidden) {
        return json_error(
            400,
            &format!("hidden must be between {} and {}", HIDDEN_RANGE.start(), HIDDEN_RANGE.end()),
        );
    }

    let run = start_run(&state, hidden);
    json_response(202, &TrainAccepted { run, hidden })
}

// ---------------------------------------------------------------------------
// Background training
// ---------------------------------------------------------------------------

/// Cancels any run in progress and starts a new one on its own thread.
/// Returns the new run number.
pub fn start_run(state: &SharedState, hidden: usize) -> u64 {
    let mut st = state.lock().unwrap();

    if let TrainingStatus::Running { stop_flag, run } = &st.training {
        info!(run, "superseding training run");
        stop_flag.store(true, Ordering::Relaxed);
    }

    let run = st.next_run;
    st.next_run += 1;

    let stop_flag = Arc::new(AtomicBool::new(false));
    st.training = TrainingStatus::Running { run, stop_flag: stop_flag.clone() };
    st.network = None;
    st.accuracy = None;
    st.hidden = hidden;
    let settings = st.settings.clone();
    drop(st);

    let state_clone = state.clone();
    thread::spawn(move || {
        let t_start = std::time::Instant::now();
        let outcome = catch_panic(|| train_from_disk(&settings, hidden, stop_flag.clone()));

        let mut st = state_clone.lock().unwrap();
        let still_current = matches!(st.training, TrainingStatus::Running { run: r, .. } if r == run);
        if !still_current || stop_flag.load(Ordering::Relaxed) {
            info!(run, "discarding superseded training run");
            return;
        }

        match outcome {
            Ok((network, accuracy)) => {
                info!(run, hidden, accuracy, "network ready");
                st.network = Some(network);
                st.accuracy = Some(accuracy);
                st.training = TrainingStatus::Done {
                    elapsed_ms: t_start.elapsed().as_millis() as u64,
                };
            }
            Err(e) => {
                error!(run, error = %e, "training failed");
                st.training = TrainingStatus::Failed { reason: format!("{:#}", e) };
            }
        }
    });

    run
}

/// Runs `f`, turning a panic into an error so the run still ends as
/// `Failed` instead of staying `Running`.
fn catch_panic<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            Err(anyhow!("training panicked: {}", message))
        }
    }
}

/// Decodes the dataset, trains a fresh network and measures test accuracy.
fn train_from_disk(
    settings: &StudioSettings,
    hidden: usize,
    stop_flag: Arc<AtomicBool>,
) -> anyhow::Result<(Network, f64)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let config = TrainConfig::new()
        .with_limit(settings.limit)
        .with_seed(settings.seed)
        .with_stop_flag(stop_flag);

    let mut network = NetworkSpec::single_hidden(hidden).build()?;

    let train_set = runtime
        .block_on(decode_mnist_from_dir(&settings.data_dir, Split::Train, settings.limit))
        .context("reading training data")?;
    if train_set.is_empty() {
        bail!("training data in {} could not be decoded", settings.data_dir.display());
    }
    train_from_scratch(&mut network, &train_set, &config)?;

    let test_set = runtime
        .block_on(decode_mnist_from_dir(&settings.data_dir, Split::Test, settings.test_limit))
        .context("reading test data")?;
    let accuracy = evaluate(&network, &test_set)?.accuracy();

    Ok((network, accuracy))
}
