//! Torrent search module
//!
//! The server never searches by itself. Query construction, the search call
//! and trust filtering all go through a [`SearchProvider`] injected at startup.

mod indexer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub use indexer::IndexerProvider;

use crate::config::SearchConfig;

/// Search provider failure
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No search provider configured (set search.base_url)")]
    NotConfigured,

    #[error("Invalid search provider URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Search request failed: {0}")]
    Upstream(String),

    #[error("Search provider returned HTTP {0}")]
    Status(u16),

    #[error("Search timed out after {0} seconds")]
    Timeout(u64),

    #[error("Search provider returned malformed results: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Provider-ready query, the output of [`SearchProvider::build_query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub category: String,
}

/// Search results: opaque items as produced by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub items: Vec<Value>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Fold episode/season into the query text, e.g. `show S02E05`
    fn build_query(
        &self,
        query: &str,
        category: &str,
        episode: Option<u32>,
        season: Option<u32>,
    ) -> SearchQuery {
        let query = query.trim();
        let query = match (season, episode) {
            (Some(season), Some(episode)) => format!("{query} S{season:02}E{episode:02}"),
            (Some(season), None) => format!("{query} S{season:02}"),
            // An episode number without a season is ambiguous, search by title only
            (None, _) => query.to_string(),
        };

        SearchQuery {
            query,
            category: category.trim().to_lowercase(),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError>;

    /// Keep only items uploaded by trusted users
    fn filter_by_trusted_users(&self, items: Vec<Value>) -> Vec<Value> {
        items.into_iter().filter(is_flagged_trusted).collect()
    }
}

/// Item carries an explicit `"trusted": true` marker
pub fn is_flagged_trusted(item: &Value) -> bool {
    item.get("trusted").and_then(Value::as_bool).unwrap_or(false)
}

/// Provider used when no indexer is configured: every search fails
pub struct DisabledProvider;

#[async_trait]
impl SearchProvider for DisabledProvider {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, SearchError> {
        Err(SearchError::NotConfigured)
    }
}

/// Pick the provider for the configuration
pub fn from_config(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>, SearchError> {
    match &config.base_url {
        Some(url) => Ok(Arc::new(IndexerProvider::new(url, &config.trusted_users)?)),
        None => Ok(Arc::new(DisabledProvider)),
    }
}
