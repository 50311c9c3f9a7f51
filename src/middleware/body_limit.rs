//! Request body size limit
//!
//! Rejects requests whose declared `Content-Length` exceeds the limit.
//! Bodies without a length are capped again while they are read.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::CONTENT_LENGTH;
use hyper::http::request::Parts;
use hyper::Response;

use super::Middleware;
use crate::error::ApiError;
use crate::http;
use crate::logger;

pub struct BodyLimit {
    max: u64,
}

impl BodyLimit {
    pub const fn new(max: u64) -> Self {
        Self { max }
    }
}

impl Middleware for BodyLimit {
    fn name(&self) -> &'static str {
        "body_limit"
    }

    fn before(&self, parts: &Parts) -> Option<Response<Full<Bytes>>> {
        let content_length = parts.headers.get(CONTENT_LENGTH)?;
        content_length.to_str().map_or_else(
            |_| {
                logger::log_warning("Content-Length header contains non-ASCII characters");
                None
            },
            |size_str| match size_str.parse::<u64>() {
                Ok(size) if size > self.max => {
                    logger::log_warning(&format!(
                        "Request body too large: {size} bytes (max: {})",
                        self.max
                    ));
                    Some(http::error_response(&ApiError::PayloadTooLarge {
                        max: self.max,
                    }))
                }
                Err(_) => {
                    logger::log_warning(&format!(
                        "Invalid Content-Length value: '{size_str}', skipping size check"
                    ));
                    None
                }
                _ => None,
            },
        )
    }
}
