//! Frame file reader
//!
//! Every lookup re-reads the file from disk; nothing is cached.

use serde_json::Value;
use std::io::ErrorKind;

use super::catalog::FrameCatalog;
use super::error::FrameError;
use crate::logger;

impl FrameCatalog {
    /// Load and parse the JSON document for `frame_type`
    ///
    /// Returns the whole parsed document or a typed failure, never partial data.
    pub async fn lookup(&self, frame_type: &str) -> Result<Value, FrameError> {
        let path = self.resolve(frame_type)?;

        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        logger::log_frame_lookup(frame_type, &path, exists);

        let data = tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                FrameError::FileNotFound { path: path.clone() }
            } else {
                FrameError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        serde_json::from_slice(&data).map_err(|source| FrameError::ParseError { path, source })
    }
}
