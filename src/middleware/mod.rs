//! Middleware chain
//!
//! An ordered list of interceptors around the route dispatcher. `before`
//! runs in registration order and the first middleware returning a response
//! short-circuits the request. `after` runs on every response, in reverse
//! registration order, including short-circuited ones.

mod body_limit;
mod cors;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::Response;

pub use body_limit::BodyLimit;
pub use cors::Cors;

use crate::config::Config;
use crate::error::StartupError;

pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect the request head; return a response to skip the handler
    fn before(&self, _parts: &Parts) -> Option<Response<Full<Bytes>>> {
        None
    }

    /// Decorate an outgoing response
    fn after(&self, _response: &mut Response<Full<Bytes>>) {}
}

#[derive(Default)]
pub struct MiddlewareChain {
    layers: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, layer: impl Middleware + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Standard chain: CORS first so preflights never reach the size check
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        Ok(Self::new()
            .with(Cors::from_config(&config.cors)?)
            .with(BodyLimit::new(config.http.max_body_size)))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    pub fn before(&self, parts: &Parts) -> Option<Response<Full<Bytes>>> {
        self.layers.iter().find_map(|layer| layer.before(parts))
    }

    pub fn after(&self, response: &mut Response<Full<Bytes>>) {
        for layer in self.layers.iter().rev() {
            layer.after(response);
        }
    }
}
