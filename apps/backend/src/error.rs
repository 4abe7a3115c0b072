//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sentences_core::{
    ErrorClass, ExportError, GenerationError, PersistenceError, RemoteError, StoreError,
};
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing credential, model, deck or note type.
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Precondition(String),

    /// Model output that did not match the requested schema.
    #[error("{0}")]
    Validation(String),

    /// The same operation is already running on the target.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Configuration(_) => (StatusCode::BAD_REQUEST, "configuration_error"),
            ApiError::Precondition(_) => (StatusCode::BAD_REQUEST, "precondition_failed"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "already_running"),
            ApiError::Remote(_) => (StatusCode::BAD_GATEWAY, "remote_error"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn from_class(class: ErrorClass, message: String) -> Self {
        match class {
            ErrorClass::Configuration => ApiError::Configuration(message),
            ErrorClass::Precondition => ApiError::Precondition(message),
            ErrorClass::Validation => ApiError::Validation(message),
            ErrorClass::RemoteService => ApiError::Remote(message),
            ErrorClass::State => ApiError::Conflict(message),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::EntryNotFound(id) => ApiError::NotFound(format!("word entry {id}")),
            other => ApiError::from_class(other.class(), other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::from_class(e.class(), e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateDefinition { .. } => ApiError::BadRequest(e.to_string()),
            _ => ApiError::NotFound(e.to_string()),
        }
    }
}

impl From<RemoteError> for ApiError {
    fn from(e: RemoteError) -> Self {
        ApiError::Remote(e.to_string())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        ApiError::Storage(e.to_string())
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
