//! Routing module
//!
//! Route table mapping method + path pattern to an [`Endpoint`].

mod matcher;

pub use matcher::{Endpoint, Params, RouteMatch, RouteTable};

use hyper::Method;

use crate::config::HealthConfig;

/// The server's route table
pub fn standard_routes(health: &HealthConfig) -> RouteTable {
    let table = RouteTable::new()
        .route(Method::GET, "/frames/{frame_type}", Endpoint::Frames)
        .route(Method::GET, "/test", Endpoint::TestProbe)
        .route(Method::POST, "/test", Endpoint::TestEcho)
        .route(Method::POST, "/torrent/search", Endpoint::TorrentSearch)
        .route(Method::GET, "/hello", Endpoint::Hello);

    if health.enabled {
        table
            .route(Method::GET, &health.liveness_path, Endpoint::Health)
            .route(Method::GET, &health.readiness_path, Endpoint::Health)
    } else {
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_routes_toggle() {
        let enabled = standard_routes(&HealthConfig::default());
        assert!(matches!(
            enabled.match_route(&Method::GET, "/healthz"),
            RouteMatch::Found {
                endpoint: Endpoint::Health,
                ..
            }
        ));

        let disabled = standard_routes(&HealthConfig {
            enabled: false,
            ..HealthConfig::default()
        });
        assert_eq!(
            disabled.match_route(&Method::GET, "/healthz"),
            RouteMatch::NotFound
        );
        assert_eq!(disabled.routes().len(), 5);
    }
}
