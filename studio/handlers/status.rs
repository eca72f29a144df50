use serde::Serialize;

use crate::routes::{json_response, HttpResponse};
use crate::state::{SharedState, TrainingStatus};

#[derive(Serialize)]
struct StatusResponse {
    trained: bool,
    training: bool,
    accuracy: Option<f64>,
    hidden: usize,
    elapsed_ms: Option<u64>,
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /status
// ---------------------------------------------------------------------------

pub fn handle(state: SharedState) -> HttpResponse {
    let st = state.lock().unwrap();
    let (elapsed_ms, error) = match &st.training {
        TrainingStatus::Done { elapsed_ms } => (Some(*elapsed_ms), None),
        TrainingStatus::Failed { reason } => (None, Some(reason.clone())),
        TrainingStatus::Idle | TrainingStatus::Running { .. } => (None, None),
    };

    let body = StatusResponse {
        trained: st.network.is_some(),
        training: st.is_training(),
        accuracy: st.accuracy,
        hidden: st.hidden,
        elapsed_ms,
        error,
    };
    json_response(200, &body)
}
