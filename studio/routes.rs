use std::io::{Cursor, Read};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::debug;

use crate::handlers;
use crate::state::SharedState;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn content_type(value: &[u8]) -> Header {
    Header::from_bytes(&b"Content-Type"[..], value).expect("static header is valid")
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> HttpResponse {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"null".to_vec());
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        vec![content_type(b"application/json")],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub fn json_error(status: u16, message: &str) -> HttpResponse {
    json_response(status, &ErrorBody { error: message })
}

pub fn not_found() -> HttpResponse {
    json_error(404, "not found")
}

/// Reads the request body as UTF-8 text.
pub fn read_body(request: &mut Request) -> Result<String, HttpResponse> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|_| json_error(400, "request body is not valid UTF-8"))?;
    Ok(body)
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("").to_owned();
    debug!(%method, %path, "request");

    let response = match (method, path.as_str()) {
        (Method::Post, "/predict") => handlers::predict::handle(&mut request, state),
        (Method::Post, "/train")   => handlers::train::handle_start(&mut request, state),
        (Method::Get,  "/status")  => handlers::status::handle(state),
        _ => not_found(),
    };

    let _ = request.respond(response);
}
