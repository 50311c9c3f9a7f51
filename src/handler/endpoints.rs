//! Endpoint handlers
//!
//! Each handler produces an envelope or an [`ApiError`]; the router turns
//! both into responses.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::AppState;
use crate::error::ApiError;
use crate::http::Envelope;
use crate::logger;
use crate::routing::Params;
use crate::search::SearchError;

/// Body of `POST /torrent/search`
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub category: String,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub allow_untrusted_users: bool,
}

const SEARCH_REQUIRED_FIELDS: [&str; 2] = ["query", "category"];

/// `GET /frames/{frame_type}`
pub async fn frames(state: &AppState, params: &Params) -> Result<Envelope, ApiError> {
    let frame_type = params.get("frame_type").unwrap_or_default();
    let document = state.frames.lookup(frame_type).await?;
    Ok(Envelope::with_data(document))
}

/// `GET /test` and the health probes
pub const fn probe() -> Envelope {
    Envelope::ok()
}

/// `POST /test`: echo the decoded body; an empty body echoes `null`
pub async fn test_echo<B>(body: B, state: &AppState) -> Result<Envelope, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = read_body(body, state.config.http.max_body_size).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidBody(e.to_string()))?
    };
    Ok(Envelope::with_response(value))
}

/// `POST /torrent/search`
pub async fn torrent_search<B>(body: B, state: &AppState) -> Result<Envelope, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = read_body(body, state.config.http.max_body_size).await?;
    let request = decode_search_request(&bytes)?;

    let provider = &state.search;
    let query = provider.build_query(
        &request.query,
        &request.category,
        request.episode,
        request.season,
    );

    let timeout_secs = state.config.search.timeout_secs;
    let results = tokio::time::timeout(Duration::from_secs(timeout_secs), provider.search(&query))
        .await
        .map_err(|_| SearchError::Timeout(timeout_secs))??;

    let items = if request.allow_untrusted_users {
        results.items
    } else {
        provider.filter_by_trusted_users(results.items)
    };

    logger::log_search(provider.name(), &query.query, &query.category, items.len());
    Ok(Envelope::with_response(json!({ "items": items })))
}

/// `GET /hello`: summary of the running configuration
pub fn hello(state: &AppState) -> Envelope {
    let config = &state.config;
    Envelope::with_response(json!({
        "server": {
            "host": config.server.host,
            "port": config.server.port,
        },
        "frames": {
            "root_dir": state.frames.root().display().to_string(),
            "types": state.frames.known_types(),
        },
        "search_provider": state.search.name(),
        "middleware": state.middleware.names(),
        "routes": state
            .routes
            .routes()
            .iter()
            .map(|route| format!("{} {}", route.method, route.pattern))
            .collect::<Vec<_>>(),
    }))
}

/// Collect the body, capped at `max` bytes
async fn read_body<B>(body: B, max: u64) -> Result<Bytes, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge { max })
        }
        Err(e) => Err(ApiError::InvalidBody(format!(
            "failed to read request body: {e}"
        ))),
    }
}

/// Decode the search body, naming the first missing required field
fn decode_search_request(bytes: &[u8]) -> Result<SearchRequest, ApiError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::InvalidBody("expected a JSON object".to_string()));
    }

    if let Some(field) = SEARCH_REQUIRED_FIELDS
        .iter()
        .find(|field| value.get(**field).map_or(true, Value::is_null))
    {
        return Err(ApiError::MissingField(*field));
    }

    serde_json::from_value(value).map_err(|e| ApiError::InvalidBody(e.to_string()))
}
