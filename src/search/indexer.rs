//! HTTP indexer search provider
//!
//! Queries a plain-HTTP JSON indexer:
//! `GET <base_url>?q=<query>&category=<category>` answering `{"items": [...]}`.

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::Request;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

use super::{is_flagged_trusted, SearchError, SearchProvider, SearchQuery, SearchResults};

pub struct IndexerProvider {
    base_url: Url,
    trusted_users: HashSet<String>,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl IndexerProvider {
    pub fn new(base_url: &str, trusted_users: &[String]) -> Result<Self, SearchError> {
        let invalid = |reason: String| SearchError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid(format!(
                "unsupported scheme '{}', only http is supported",
                url.scheme()
            )));
        }

        Ok(Self {
            base_url: url,
            trusted_users: trusted_users.iter().cloned().collect(),
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    fn request_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", &query.query)
            .append_pair("category", &query.category);
        url
    }

    fn is_trusted(&self, item: &Value) -> bool {
        is_flagged_trusted(item)
            || item
                .get("uploader")
                .and_then(Value::as_str)
                .is_some_and(|uploader| self.trusted_users.contains(uploader))
    }
}

#[async_trait]
impl SearchProvider for IndexerProvider {
    fn name(&self) -> &'static str {
        "indexer"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let url = self.request_url(query);
        let uri: hyper::Uri = url
            .as_str()
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| SearchError::Upstream(e.to_string()))?;

        let request = Request::get(uri)
            .header("Accept", "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| SearchError::Upstream(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| SearchError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| SearchError::Upstream(e.to_string()))?
            .to_bytes();

        Ok(serde_json::from_slice(&body)?)
    }

    fn filter_by_trusted_users(&self, items: Vec<Value>) -> Vec<Value> {
        items.into_iter().filter(|item| self.is_trusted(item)).collect()
    }
}
