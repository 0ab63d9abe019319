use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::services::downloads::DownloadError;
use crate::services::quota_ledger::QuotaError;
use crate::services::upload::UploadError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `EMAIL_TAKEN`, `QUOTA_EXCEEDED`, `RATE_LIMITED`, `STORAGE_ERROR`,
    /// `CONTENT_MISSING`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Name must not be empty")]
    pub message: String,
    /// Extra machine-readable context (quota numbers for `QUOTA_EXCEEDED`).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
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
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    EmailTaken,
    QuotaExceeded {
        limit: i64,
        used: i64,
        requested: i64,
    },
    /// Rate limit exceeded. Contains seconds until retry is allowed.
    RateLimited {
        retry_after: u64,
    },
    /// The content store failed (disk full, permissions, ...).
    Storage(String),
    /// A content row exists but its bytes are gone from the store.
    ContentMissing(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid email or password"),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("PERMISSION_DENIED", "Insufficient permissions"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody::new("EMAIL_TAKEN", "Email is already registered"),
            ),
            AppError::QuotaExceeded {
                limit,
                used,
                requested,
            } => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "QUOTA_EXCEEDED",
                    message: "Storage quota exceeded".into(),
                    details: Some(serde_json::json!({
                        "quota": limit,
                        "used": used,
                        "requested": requested,
                    })),
                },
            ),
            AppError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody::new(
                    "RATE_LIMITED",
                    format!("Rate limit exceeded. Try again in {} seconds", retry_after),
                ),
            ),
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("STORAGE_ERROR", "Failed to store file content"),
                )
            }
            AppError::ContentMissing(detail) => {
                tracing::error!("Stored content missing: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("CONTENT_MISSING", "File content is missing from storage"),
                )
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
        let retry_after = if let AppError::RateLimited { retry_after } = &self {
            Some(*retry_after)
        } else {
            None
        };

        let (status, body) = self.status_and_body();

        if let Some(seconds) = retry_after {
            (status, [("Retry-After", seconds.to_string())], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(location) => AppError::ContentMissing(location),
            StorageError::InvalidHash(msg) => AppError::Validation(format!("Invalid hash: {msg}")),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<QuotaError> for AppError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::Exceeded {
                limit,
                used,
                requested,
            } => AppError::QuotaExceeded {
                limit,
                used,
                requested,
            },
            QuotaError::AccountNotFound(_) => AppError::NotFound("User not found".into()),
            QuotaError::Database(e) => AppError::from(e),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidInput(msg) => AppError::Validation(msg),
            UploadError::Quota(e) => AppError::from(e),
            UploadError::StorageWrite(e) => AppError::Storage(e.to_string()),
            UploadError::Database(e) => AppError::from(e),
        }
    }
}

impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::ContentRowMissing(id) => {
                AppError::Internal(format!("content row {id} referenced but missing"))
            }
            DownloadError::Storage(e) => match e {
                StorageError::InvalidLocation(loc) => {
                    AppError::ContentMissing(format!("unreadable location {loc}"))
                }
                other => AppError::from(other),
            },
            DownloadError::Database(e) => AppError::from(e),
        }
    }
}
