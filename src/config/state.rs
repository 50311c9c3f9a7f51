// Application state module
// Everything a request handler needs, built once at startup and shared read-only

use std::sync::Arc;

use super::types::Config;
use crate::error::StartupError;
use crate::frames::FrameCatalog;
use crate::middleware::MiddlewareChain;
use crate::routing::{self, RouteTable};
use crate::search::SearchProvider;

/// Application state
pub struct AppState {
    pub config: Config,
    pub frames: FrameCatalog,
    pub routes: RouteTable,
    pub middleware: MiddlewareChain,
    pub search: Arc<dyn SearchProvider>,
}

impl AppState {
    /// Assemble state from configuration and an injected search provider
    pub fn new(config: Config, search: Arc<dyn SearchProvider>) -> Result<Self, StartupError> {
        let frames = FrameCatalog::from_config(&config.frames)?;
        let routes = routing::standard_routes(&config.health);
        let middleware = MiddlewareChain::from_config(&config)?;

        Ok(Self {
            config,
            frames,
            routes,
            middleware,
            search,
        })
    }
}
