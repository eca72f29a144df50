use serde::{Deserialize, Serialize};
use tiny_http::Request;

use digit_nn::Matrix;

use crate::routes::{json_error, json_response, read_body, HttpResponse};
use crate::state::SharedState;

#[derive(Deserialize)]
struct PredictRequest {
    /// Grayscale pixels in `[0, 1]`, row-major.
    pixels: Vec<f64>,
}

#[derive(Serialize)]
struct PredictResponse {
    scores: Vec<f64>,
    digit: usize,
}

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

pub fn handle(request: &mut Request, state: SharedState) -> HttpResponse {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    let req: PredictRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => return json_error(400, &format!("invalid request body: {}", e)),
    };

    let st = state.lock().unwrap();
    let Some(network) = st.network.as_ref() else {
        return json_error(409, "no trained network yet");
    };

    let n = network.input_size();
    let input = match Matrix::from_flat(req.pixels, n, 1) {
        Ok(input) => input,
        Err(e) => return json_error(400, &e.to_string()),
    };

    match network.run(&input) {
        Ok(output) => {
            let digit = output.argmax();
            json_response(200, &PredictResponse { scores: output.into_vec(), digit })
        }
        Err(e) => json_error(500, &e.to_string()),
    }
}
