//! Request and startup error types

use hyper::StatusCode;
use thiserror::Error;

use crate::frames::FrameError;
use crate::search::SearchError;

/// Failure of a single request, always answered with a failure envelope
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body too large (max: {max} bytes)")]
    PayloadTooLarge { max: u64 },

    #[error("Search provider failure: {0}")]
    ExternalCollaboratorFailure(String),

    #[error("No route for {method} {path}")]
    NotFound { method: String, path: String },

    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        method: String,
        path: String,
        allow: String,
    },
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Frame(FrameError::UnknownFrameType { .. } | FrameError::FileNotFound { .. })
            | Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Frame(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingField(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ExternalCollaboratorFailure(_) => StatusCode::BAD_GATEWAY,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self::ExternalCollaboratorFailure(err.to_string())
    }
}

/// Failure while assembling the application state at startup
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid frame configuration: {0}")]
    Frames(#[from] FrameError),

    #[error("Invalid CORS header value: {0}")]
    Cors(#[from] hyper::header::InvalidHeaderValue),

    #[error("Invalid search configuration: {0}")]
    Search(#[from] SearchError),
}
