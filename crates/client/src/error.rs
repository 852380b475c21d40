//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got an HTTP answer (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other 4xx answer
    #[error("Rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// 5xx answer
    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading or writing the local cache failed
    #[error("Cache error: {0}")]
    Cache(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Failures worth retrying later: the server was unreachable or broke.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server { .. })
    }

    /// The server understood the request and refused it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Rejected { .. })
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
