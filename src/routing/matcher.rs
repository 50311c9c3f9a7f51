//! Route matching module
//!
//! Matches method + path against an ordered route table. Path patterns are
//! split on `/`; a `{name}` segment captures exactly one non-empty segment.

use hyper::Method;

/// Handler selected by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /frames/{frame_type}`
    Frames,
    /// `GET /test`
    TestProbe,
    /// `POST /test`
    TestEcho,
    /// `POST /torrent/search`
    TorrentSearch,
    /// `GET /hello`
    Hello,
    /// Liveness / readiness probes
    Health,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Parsed path pattern, e.g. `/frames/{frame_type}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map_or_else(
                        || Segment::Literal(segment.to_string()),
                        |name| Segment::Param(name.to_string()),
                    )
            })
            .collect();
        Self { segments }
    }

    /// Match a request path, returning captured parameters
    pub fn matches(&self, path: &str) -> Option<Params> {
        let mut params = Params::default();
        let mut parts = split_path(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.0.push((name.clone(), part.to_string()));
                }
                _ => return None,
            }
        }

        // Trailing path segments mean a different resource
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => write!(f, "/{literal}")?,
                Segment::Param(name) => write!(f, "/{{{name}}}")?,
            }
        }
        Ok(())
    }
}

fn split_path(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Captured path parameters in pattern order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub endpoint: Endpoint,
}

/// Outcome of matching a request against the table
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch {
    Found { endpoint: Endpoint, params: Params },
    /// The path exists under other methods
    MethodNotAllowed { allow: Vec<Method> },
    NotFound,
}

/// Ordered route table; first match wins
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, method: Method, pattern: &str, endpoint: Endpoint) -> Self {
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(pattern),
            endpoint,
        });
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch {
        let mut allow = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            if route.method == *method {
                return RouteMatch::Found {
                    endpoint: route.endpoint,
                    params,
                };
            }
            if !allow.contains(&route.method) {
                allow.push(route.method.clone());
            }
        }

        if allow.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed { allow }
        }
    }
}
