//! Unified error handling with Sentry integration.
//!
//! Storefront handlers return `Result<T, AppError>`. API failures are
//! captured to Sentry before a plain error page is sent.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::client::ClientError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shop API call failed.
    #[error("API error: {0}")]
    Client(#[from] ClientError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Client(ClientError::Api { status, .. }) if *status < 500 => {
                StatusCode::BAD_REQUEST
            }
            Self::Client(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose API details to shoppers
        let message = match &self {
            Self::Client(ClientError::Api { message, .. }) if status == StatusCode::BAD_REQUEST => {
                message.clone()
            }
            Self::Client(_) => "The shop is unavailable right now. Please try again.".to_owned(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_api_rejections_are_bad_requests() {
        let err = ClientError::Api {
            status: 400,
            message: "Unknown filter".to_owned(),
        };
        assert_eq!(status_of(err.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_outages_are_bad_gateway() {
        let err = ClientError::Api {
            status: 503,
            message: "down".to_owned(),
        };
        assert_eq!(status_of(err.into()), StatusCode::BAD_GATEWAY);
    }
}
