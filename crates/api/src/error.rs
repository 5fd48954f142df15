//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Failures reach the client as
//! `{"error": "<message>"}` with status 400, except access-control
//! rejections (401/403) and internal errors (500). Store failures are
//! captured to Sentry first.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::ValidationError;
use crate::checkout::OrderError;
use crate::db::{RepositoryError, db_error_message};
use crate::services::auth::AuthError;

/// Application-level error type for the shop API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Product or query input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Order input was rejected.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the error is a server-side fault worth reporting to Sentry.
    fn is_reportable(&self) -> bool {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => !err.is_client_error(),
            Self::Internal(_) => true,
            _ => false,
        }
    }

    /// The message shown to the client. Store internals never leak.
    fn client_message(&self) -> String {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => db_error_message(err),
            Self::Auth(AuthError::InvalidCredentials) => {
                "Email and password do not match".to_owned()
            }
            Self::Auth(AuthError::UserNotFound) => "User not found".to_owned(),
            Self::Auth(AuthError::EmailTaken) => "Email is taken".to_owned(),
            Self::Auth(AuthError::InvalidEmail(_)) => "Please provide a valid email".to_owned(),
            Self::Auth(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => "Something went wrong".to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Reported for any multipart body that cannot be read.
pub const UPLOAD_FAILED: &str = "Image could not be uploaded";

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Multipart request rejected");
        Self::BadRequest(UPLOAD_FAILED.to_owned())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::debug!(error = %err.body_text(), "Multipart body unreadable");
        Self::BadRequest(UPLOAD_FAILED.to_owned())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
