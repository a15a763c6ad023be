//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::object_store::StoreError;

/// Errors returned by the read API. Every variant renders as a JSON string.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameters: {0}")]
    MissingParameters(&'static str),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("File not found")]
    NotFound,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameters(_) | Self::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::InvalidKey(key) => Self::InvalidParameters(key),
            StoreError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(message) = &self {
            tracing::error!("Read API error: {}", message);
        }
        (self.status(), Json(self.to_string())).into_response()
    }
}
