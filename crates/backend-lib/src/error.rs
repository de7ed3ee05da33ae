// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use crate::auth::AuthError;
use crate::middleware::auth::Rejection;
use crate::users::UserError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medika_common::ErrorResponse;
use thiserror::Error;
use tracing::error;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
pub const INTERNAL: &str = "Internal server error";

/// HTTP-boundary error. The payload is the public message; details are logged where they occur.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "AUTH_001",
            AppError::Forbidden(_) => "AUTH_002",
            AppError::NotFound(_) => "NF_001",
            AppError::BadRequest(_) => "VAL_001",
            AppError::Conflict(_) => "CONF_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Public message rendered in the response body
    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::BadRequest(m)
            | AppError::Conflict(m)
            | AppError::Internal(m) => m,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.message().to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        response
            .headers_mut()
            .insert("x-error-code", axum::http::HeaderValue::from_static(self.error_code()));
        response
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::unauthorized(INVALID_CREDENTIALS),
            AuthError::InvalidToken(_) | AuthError::MalformedSubject(_) | AuthError::PrincipalNotFound(_) => {
                AppError::unauthorized("Invalid Token")
            },
            AuthError::Revocation(ref e) => {
                error!(error = %e, "Failed to blacklist token");
                AppError::internal("Failed to logout")
            },
            other => {
                error!(error = %other, "Auth infrastructure failure");
                AppError::internal(INTERNAL)
            },
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound("User not found".into()),
            UserError::EmailTaken(_) => AppError::Conflict("Email already exists".into()),
            UserError::IncorrectPassword => AppError::BadRequest("Incorrect old password".into()),
            other => {
                error!(error = %other, "User management failure");
                AppError::internal(INTERNAL)
            },
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::StoreUnavailable => AppError::internal(INTERNAL),
            other => AppError::unauthorized(other.message()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        AppError::BadRequest("Invalid request format".into())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected query string");
        AppError::BadRequest("Invalid query parameters".into())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected path parameter");
        AppError::BadRequest("Invalid user ID".into())
    }
}
