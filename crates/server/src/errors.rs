use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

pub const ENDPOINT_NOT_FOUND: &str = "Endpoint not found";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Error reply of the catalog API: a status plus `{"error": message}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn endpoint_not_found() -> Self {
        Self::not_found(ENDPOINT_NOT_FOUND)
    }

    /// Generic 500; the detail goes to the log only.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(err = %detail, "API error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage unavailable: {0}")]
    Storage(#[from] service::errors::ServiceError),
}
