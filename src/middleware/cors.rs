//! CORS middleware
//!
//! Answers every `OPTIONS` request as a preflight and stamps the
//! cross-origin headers on every response, errors included.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, InvalidHeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::http::request::Parts;
use hyper::{Method, Response};

use super::Middleware;
use crate::config::CorsConfig;
use crate::http;

pub struct Cors {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl Cors {
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(&config.allow_origin)?,
            allow_methods: HeaderValue::from_str(&config.allow_methods)?,
            allow_headers: HeaderValue::from_str(&config.allow_headers)?,
        })
    }
}

impl Middleware for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn before(&self, parts: &Parts) -> Option<Response<Full<Bytes>>> {
        (parts.method == Method::OPTIONS).then(http::build_preflight_response)
    }

    fn after(&self, response: &mut Response<Full<Bytes>>) {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }
}
