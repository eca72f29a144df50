/// digit-nn Studio
///
/// Inference server for a drawing client. On startup it trains the digit
/// classifier in the background, then answers:
///
///   POST /predict   {"pixels": [784 values in 0..1]} -> {"scores": [...], "digit": n}
///   POST /train     {"hidden": n}  retrain with a new hidden layer size
///   GET  /status    training state and tested accuracy
///
/// Run with:
///   cargo run --bin studio --release -- --data ./mnist
mod state;
mod routes;
mod handlers;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tiny_http::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use state::{StudioSettings, StudioState};

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Serve the digit classifier over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// Directory holding train_images, train_labels, test_images, test_labels
    #[arg(short, long, env = "DIGIT_NN_DATA", default_value = "mnist")]
    data: PathBuf,

    /// Hidden layer size of the initial run
    #[arg(long, default_value = "10")]
    hidden: usize,

    /// Maximum training samples per run
    #[arg(long)]
    limit: Option<usize>,

    /// Maximum test samples per run
    #[arg(long)]
    test_limit: Option<usize>,

    /// Random seed for reproducible initialization
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if !handlers::train::HIDDEN_RANGE.contains(&args.hidden) {
        anyhow::bail!("--hidden must be between 1 and 200");
    }

    let server = Server::http(&args.addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", args.addr, e))?;

    let settings = StudioSettings {
        data_dir: args.data,
        limit: args.limit,
        test_limit: args.test_limit,
        seed: args.seed,
    };
    let shared_state = Arc::new(Mutex::new(StudioState::new(settings, args.hidden)));

    info!(addr = %args.addr, "studio listening");
    handlers::train::start_run(&shared_state, args.hidden);

    // Each request is dispatched on its own thread so a slow client does
    // not stall the others.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}
