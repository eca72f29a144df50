use std::path::PathBuf;
use std::sync::{atomic::AtomicBool, Arc, Mutex};

use digit_nn::Network;

// ---------------------------------------------------------------------------
// Training status
// ---------------------------------------------------------------------------

pub enum TrainingStatus {
    /// No training has been started yet.
    Idle,
    /// A background thread is training run number `run`.
    Running {
        run: u64,
        stop_flag: Arc<AtomicBool>,
    },
    /// The last run finished and its network is being served.
    Done { elapsed_ms: u64 },
    /// The last run failed (unreadable data, shape error, ...).
    Failed { reason: String },
}

/// Settings fixed at startup.
#[derive(Debug, Clone)]
pub struct StudioSettings {
    pub data_dir: PathBuf,
    pub limit: Option<usize>,
    pub test_limit: Option<usize>,
    pub seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Main state struct
// ---------------------------------------------------------------------------

pub struct StudioState {
    pub settings: StudioSettings,
    /// Network answering `/predict`; `None` while (re)training.
    pub network: Option<Network>,
    /// Hidden layer size of the current or most recent run.
    pub hidden: usize,
    /// Test accuracy of `network`, once evaluated.
    pub accuracy: Option<f64>,
    pub training: TrainingStatus,
    /// Incremented for every started run so a superseded run cannot
    /// overwrite a newer one.
    pub next_run: u64,
}

impl StudioState {
    pub fn new(settings: StudioSettings, hidden: usize) -> Self {
        StudioState {
            settings,
            network: None,
            hidden,
            accuracy: None,
            training: TrainingStatus::Idle,
            next_run: 0,
        }
    }

    pub fn is_training(&self) -> bool {
        matches!(self.training, TrainingStatus::Running { .. })
    }
}

/// Shared state type: an `Arc<Mutex<StudioState>>` passed to every handler.
pub type SharedState = Arc<Mutex<StudioState>>;
