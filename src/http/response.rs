//! Response handling and transformation.
//!
//! # Responsibilities
//! - Pass backend responses through to the client
//! - Strip hop-by-hop headers on the way back
//! - Render the load balancer's own terminal failures
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Backend 5xx responses are passed through untouched, they are not transport failures
//! - Both terminal conditions surface as 503 with a plain-text body

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

use crate::http::request::strip_hop_by_hop;

/// Body returned when every backend is dead.
pub const NO_PEER_BODY: &str = "No alive peer available";

/// Body returned when a request has used up its distinct-backend attempts.
pub const ATTEMPTS_EXHAUSTED_BODY: &str = "Service not available";

/// Convert a backend response into one suitable for the client.
pub fn from_upstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// 503 with a plain-text explanation.
pub fn service_unavailable(message: &'static str) -> Response<Body> {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        message,
    )
        .into_response()
}

/// 400 when the request body could not be read.
pub fn bad_request() -> Response<Body> {
    (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
}

/// 413 for bodies too large to buffer for replay.
pub fn payload_too_large() -> Response<Body> {
    (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
}
