//! Custom error types for the API service

use auth::AuthError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Valid identity, insufficient role
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique key
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooManyRequests(String),

    /// Unexpected failure; the detail is logged, not returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "auth_error",
            ApiError::Forbidden(_) => "forbidden_error",
            ApiError::NotFound(_) => "not_found_error",
            ApiError::Conflict(_) => "conflict_error",
            ApiError::TooManyRequests(_) => "rate_limited_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Client facing message; internal details never appear here
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Detail of an internal failure, attached to the 500 response so the
/// development-mode layer can echo it.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

/// Error body `{"error": kind, "message": text}`
pub fn error_body(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": kind,
        "message": message,
    }));
    (status, body).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = error_body(self.status(), self.kind(), &self.public_message());

        if let ApiError::Internal(detail) = self {
            error!("Internal error: {}", detail);
            response.extensions_mut().insert(InternalDetail(detail));
        }

        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::IncorrectPassword => ApiError::Unauthorized(err.to_string()),
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::NotFound(msg) => ApiError::NotFound(msg),
            AuthError::RateLimited => ApiError::TooManyRequests(err.to_string()),
            AuthError::Crypto(_) | AuthError::Config(_) => ApiError::Internal(err.to_string()),
            AuthError::Storage(db) => db.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden("no".into())).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn conflict_is_reported_as_bad_request() {
        let err = ApiError::from(AuthError::Conflict("Username already exists".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "conflict_error");
    }

    #[test]
    fn internal_detail_is_suppressed_by_default() {
        let err = ApiError::from(DatabaseError::Closed);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");

        let response = err.into_response();
        let detail = response.extensions().get::<InternalDetail>().unwrap();
        assert_eq!(detail.0, "Database connection is closed");
    }

    #[test]
    fn storage_conflict_passes_through_auth_error() {
        let err = ApiError::from(AuthError::Storage(DatabaseError::Conflict("dup".into())));
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
