//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: runs the middleware chain,
//! matches the route table, calls the endpoint and writes the access log.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue, REFERER, SERVER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::endpoints;
use crate::config::AppState;
use crate::error::ApiError;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{Endpoint, RouteMatch};

/// Main entry point for HTTP request handling
///
/// Never fails: every outcome, errors included, is a JSON envelope response.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let mut response = match state.middleware.before(&parts) {
        Some(response) => response,
        None => dispatch(&parts, body, &state).await,
    };
    state.middleware.after(&mut response);

    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    if state.config.logging.access_log {
        log_access(&parts, &response, peer_addr, started, &state);
    }

    Ok(response)
}

async fn dispatch<B>(parts: &Parts, body: B, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = parts.uri.path();

    let result = match state.routes.match_route(&parts.method, path) {
        RouteMatch::Found { endpoint, params } => match endpoint {
            Endpoint::Frames => endpoints::frames(state, &params).await,
            Endpoint::TestProbe | Endpoint::Health => Ok(endpoints::probe()),
            Endpoint::TestEcho => endpoints::test_echo(body, state).await,
            Endpoint::TorrentSearch => endpoints::torrent_search(body, state).await,
            Endpoint::Hello => Ok(endpoints::hello(state)),
        },
        RouteMatch::MethodNotAllowed { allow } => Err(ApiError::MethodNotAllowed {
            method: parts.method.to_string(),
            path: path.to_string(),
            allow: allow
                .iter()
                .map(hyper::Method::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }),
        RouteMatch::NotFound => Err(ApiError::NotFound {
            method: parts.method.to_string(),
            path: path.to_string(),
        }),
    };

    match result {
        Ok(envelope) => http::json_response(StatusCode::OK, &envelope),
        Err(err) => {
            if err.status().is_server_error() {
                logger::log_error(&format!("{} {path}: {err}", parts.method));
            } else {
                logger::log_warning(&format!("{} {path}: {err}", parts.method));
            }
            http::error_response(&err)
        }
    }
}

fn log_access(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: Option<SocketAddr>,
    started: Instant,
    state: &AppState,
) {
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.map_or_else(|| "-".to_string(), |addr| addr.ip().to_string()),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = format!("{:?}", parts.version)
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::search::{SearchError, SearchProvider, SearchQuery, SearchResults};
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_LENGTH};
    use hyper::Method;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records the last query and answers with fixed items
    struct FakeProvider {
        items: Vec<Value>,
        seen: Mutex<Option<SearchQuery>>,
    }

    impl FakeProvider {
        fn new(items: Vec<Value>) -> Self {
            Self {
                items,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
            *self.seen.lock().unwrap() = Some(query.clone());
            Ok(SearchResults {
                items: self.items.clone(),
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SearchProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, SearchError> {
            Err(SearchError::Status(500))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl SearchProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, SearchError> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(SearchResults::default())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn fixture_with(provider: Arc<dyn SearchProvider>, tweak: impl FnOnce(&mut Config)) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("all_weapon_frames.json"),
            r#"{"sword": {"damage": 10}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("all_armor_frames.json"),
            r#"{"plate": {"defense": 7}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("all_zone_frames.json"), "{broken").unwrap();

        let mut config = Config::for_root_dir(dir.path());
        config.logging.access_log = false;
        tweak(&mut config);

        let state = Arc::new(AppState::new(config, provider).unwrap());
        Fixture { _dir: dir, state }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(FakeProvider::new(Vec::new())), |_| {})
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: &str,
    ) -> (StatusCode, hyper::HeaderMap, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let response = handle_request(req, Arc::clone(state), None).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }

    #[tokio::test]
    async fn test_frames_known_types() {
        let fx = fixture();
        let (status, _, body) = send(&fx.state, Method::GET, "/frames/weapon", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "json_data": {"sword": {"damage": 10}}})
        );

        // Each type serves its own file, not the weapon file
        let (_, _, body) = send(&fx.state, Method::GET, "/frames/armor", "").await;
        assert_eq!(body["json_data"], json!({"plate": {"defense": 7}}));
    }

    #[tokio::test]
    async fn test_frames_unknown_type() {
        let fx = fixture();
        let (status, _, body) = send(&fx.state, Method::GET, "/frames/unknown_type", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("unknown_type"));
        assert!(body.get("json_data").is_none());
    }

    #[tokio::test]
    async fn test_frames_read_failures() {
        let fx = fixture();
        let (status, _, body) = send(&fx.state, Method::GET, "/frames/attribute", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("not found"));

        let (status, _, body) = send(&fx.state, Method::GET, "/frames/zone", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("parse"));
    }

    #[tokio::test]
    async fn test_get_test_probe() {
        let fx = fixture();
        let (status, _, body) = send(&fx.state, Method::GET, "/test", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_post_test_echo() {
        let fx = fixture();
        let (status, _, body) = send(&fx.state, Method::POST, "/test", r#"{"a":1}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "response": {"a": 1}}));

        let (_, _, body) = send(&fx.state, Method::POST, "/test", "").await;
        assert_eq!(body, json!({"success": true, "response": null}));

        let (status, _, body) = send(&fx.state, Method::POST, "/test", "{nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_cors_on_every_response() {
        let fx = fixture();
        let cases = [
            (Method::GET, "/test", ""),
            (Method::POST, "/test", r#"{"a":1}"#),
            (Method::GET, "/frames/weapon", ""),
            (Method::GET, "/frames/unknown_type", ""),
            (Method::GET, "/frames/zone", ""),
            (Method::GET, "/no/such/path", ""),
            (Method::DELETE, "/test", ""),
            (Method::POST, "/torrent/search", "{}"),
            (Method::OPTIONS, "/frames/weapon", ""),
            (Method::OPTIONS, "/anything", ""),
        ];
        for (method, uri, body) in cases {
            let (_, headers, _) = send(&fx.state, method.clone(), uri, body).await;
            assert_eq!(
                headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*",
                "missing CORS header on {method} {uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_preflight_skips_handlers() {
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        let fx = fixture_with(provider.clone(), |_| {});
        let (status, headers, body) = send(
            &fx.state,
            Method::OPTIONS,
            "/torrent/search",
            r#"{"query": "x", "category": "tv"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_eq!(headers["access-control-allow-methods"], "GET, POST, PUT, OPTIONS");
        assert!(provider.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let fx = fixture();
        let (status, _, body) = send(&fx.state, Method::GET, "/nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("/nope"));

        let (status, headers, body) = send(&fx.state, Method::PUT, "/test", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[ALLOW], "GET, POST");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let fx = fixture_with(Arc::new(FakeProvider::new(Vec::new())), |config| {
            config.http.max_body_size = 8;
        });

        // Declared length over the limit is rejected before dispatch
        let req = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(CONTENT_LENGTH, "64")
            .body(Full::new(Bytes::from(r#"{"a":"0123456789"}"#)))
            .unwrap();
        let response = handle_request(req, Arc::clone(&fx.state), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        // Without a declared length the body is capped while reading
        let (status, _, body) =
            send(&fx.state, Method::POST, "/test", r#"{"a":"0123456789"}"#).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_torrent_search_filters_untrusted_by_default() {
        let items = vec![
            json!({"name": "good", "trusted": true}),
            json!({"name": "sketchy", "trusted": false}),
        ];
        let provider = Arc::new(FakeProvider::new(items));
        let fx = fixture_with(provider.clone(), |_| {});

        let (status, _, body) = send(
            &fx.state,
            Method::POST,
            "/torrent/search",
            r#"{"query": "Show", "category": "TV", "season": 1, "episode": 2}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "response": {"items": [{"name": "good", "trusted": true}]}})
        );
        assert_eq!(
            provider.seen.lock().unwrap().clone(),
            Some(SearchQuery {
                query: "Show S01E02".to_string(),
                category: "tv".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_torrent_search_allows_untrusted_on_request() {
        let items = vec![
            json!({"name": "good", "trusted": true}),
            json!({"name": "sketchy", "trusted": false}),
        ];
        let fx = fixture_with(Arc::new(FakeProvider::new(items)), |_| {});

        let (_, _, body) = send(
            &fx.state,
            Method::POST,
            "/torrent/search",
            r#"{"query": "Show", "category": "tv", "allow_untrusted_users": true}"#,
        )
        .await;
        assert_eq!(body["response"]["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_torrent_search_missing_field() {
        let fx = fixture();
        let (status, _, body) =
            send(&fx.state, Method::POST, "/torrent/search", r#"{"query": "x"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "message": "Missing field: category"})
        );
    }

    #[tokio::test]
    async fn test_torrent_search_provider_failure() {
        let fx = fixture_with(Arc::new(FailingProvider), |_| {});
        let (status, _, body) = send(
            &fx.state,
            Method::POST,
            "/torrent/search",
            r#"{"query": "x", "category": "tv"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_torrent_search_timeout() {
        let fx = fixture_with(Arc::new(SlowProvider), |config| {
            config.search.timeout_secs = 1;
        });
        let (status, _, body) = send(
            &fx.state,
            Method::POST,
            "/torrent/search",
            r#"{"query": "x", "category": "tv"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["message"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_hello_and_health() {
        let fx = fixture();
        let (status, _, body) = send(&fx.state, Method::GET, "/hello", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["server"]["port"], 4126);
        assert_eq!(body["response"]["search_provider"], "fake");
        assert!(body["response"]["frames"]["types"]
            .as_array()
            .unwrap()
            .contains(&json!("weapon")));
        assert!(body["response"]["routes"]
            .as_array()
            .unwrap()
            .contains(&json!("GET /frames/{frame_type}")));

        let (status, headers, body) = send(&fx.state, Method::GET, "/healthz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        assert_eq!(headers[SERVER], "frame_server/0.1");
    }
}
