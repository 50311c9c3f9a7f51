//! HTTP response building module
//!
//! Turns envelopes and request errors into JSON responses.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use super::envelope::Envelope;
use crate::error::ApiError;
use crate::logger;

/// Serialize an envelope into a JSON response with the given status
pub fn json_response(status: StatusCode, body: &Envelope) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header(CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"success":false,"message":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())));
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Failure envelope carrying the error message, status mapped from the error kind
pub fn error_response(err: &ApiError) -> Response<Full<Bytes>> {
    let mut response = json_response(err.status(), &Envelope::failure(err.to_string()));
    if let ApiError::MethodNotAllowed { allow, .. } = err {
        if let Ok(value) = allow.parse() {
            response.headers_mut().insert(ALLOW, value);
        }
    }
    response
}

/// Empty 200 answer to a CORS preflight; the CORS layer adds the headers
pub fn build_preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::OK, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
