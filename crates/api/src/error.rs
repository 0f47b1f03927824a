//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers and request handlers
//! return `Result<T, AppError>`.
//!
//! Expected business-rule failures (`BusinessRule`) travel as values with a
//! human-readable message; they are part of the API contract, not faults.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::response::ApiResponse;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request validation failed; messages are aggregated per field.
    #[error("validation failed")]
    Validation(Vec<String>),

    /// Caller has no resolvable identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Entity belongs to a different tenant than the caller.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Conflicting state (e.g., duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Expected business-rule failure with a message for the caller.
    #[error("{0}")]
    BusinessRule(String),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("entity not found".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::TokenInvalid
                | AuthError::TokenExpired
                | AuthError::RefreshTokenInvalid => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::TokenCreation(_) | AuthError::PasswordHash(_) | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let (errors, message) = match &self {
            Self::Validation(errors) => (errors.clone(), "Validation failed".to_string()),
            Self::Database(_) | Self::Internal(_) => {
                (vec![], "Internal server error".to_string())
            }
            Self::Auth(err) => {
                let msg = match err {
                    AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                    AuthError::TokenInvalid | AuthError::TokenExpired => {
                        "Invalid or expired token".to_string()
                    }
                    AuthError::RefreshTokenInvalid => "Invalid refresh token".to_string(),
                    AuthError::EmailTaken => {
                        "An account with this email already exists".to_string()
                    }
                    AuthError::WeakPassword(msg) => msg.clone(),
                    AuthError::InvalidEmail(e) => e.to_string(),
                    AuthError::TokenCreation(_)
                    | AuthError::PasswordHash(_)
                    | AuthError::Repository(_) => "Authentication error".to_string(),
                };
                (vec![msg.clone()], msg)
            }
            other => {
                let msg = other.to_string();
                (vec![msg.clone()], msg)
            }
        };

        (status, Json(ApiResponse::<()>::failure(errors, message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation(vec!["x".into()])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("no token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("wrong tenant".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("customer".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BusinessRule(
                "Selected time slot is not available".into()
            )),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            AppError::from(RepositoryError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("email".into())),
            AppError::Conflict(_)
        ));
    }
}
