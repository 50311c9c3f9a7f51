//! Frame store error types

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a frame lookup or of building the frame catalog
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Invalid frame type: {name} (known types: {known})")]
    UnknownFrameType { name: String, known: String },

    #[error("Frame file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read frame file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse frame file {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid file name '{file}' for frame type '{name}'")]
    InvalidFileName { name: String, file: String },
}
