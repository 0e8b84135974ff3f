use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::media::RepositoryError;
use common::settings::FieldError;
use common::storage::StorageError;
use common::store::StoreError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::services::ServiceError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `PERMISSION_DENIED`, `NOT_FOUND`, `CONFIGURATION_ERROR`,
    /// `UPSTREAM_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid settings")]
    pub message: String,
    /// Per-field problems, present on settings validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidSettings(Vec<FieldError>),
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    /// The CDN client cannot be built; names the missing settings fields.
    Configuration(String),
    Upstream(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new("VALIDATION_ERROR", msg))
            }
            AppError::InvalidSettings(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    details: Some(details),
                    ..ErrorBody::new("VALIDATION_ERROR", "Invalid settings")
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("PERMISSION_DENIED", "Insufficient permissions"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("CONFIGURATION_ERROR", msg),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, ErrorBody::new("UPSTREAM_ERROR", msg))
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => AppError::NotFound(format!("File {id} not found")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MissingData | StorageError::SizeLimitExceeded { .. } => {
                AppError::Validation(err.to_string())
            }
            StorageError::NotFound(name) => AppError::NotFound(format!("File '{name}' not found")),
            StorageError::Configuration(msg) => AppError::Configuration(msg),
            StorageError::Upstream(msg) => AppError::Upstream(msg),
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Configuration { .. } => AppError::Configuration(err.to_string()),
            ServiceError::Validation(details) => AppError::InvalidSettings(details),
            ServiceError::Upstream(_) => AppError::Upstream(err.to_string()),
            ServiceError::MissingFileData | ServiceError::InvalidItem(_) => {
                AppError::Validation(err.to_string())
            }
            ServiceError::Storage(e) => e.into(),
            ServiceError::Store(e) => e.into(),
            ServiceError::Repository(e) => e.into(),
        }
    }
}
