//! Corona Shop storefront library.
//!
//! Server-rendered shop pages backed by the shop API. Exposed as a library
//! so the router can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod filters;
pub mod routes;
pub mod state;
pub mod ui;

use axum::{Router, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Static assets, relative to the workspace root.
const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    fn test_state() -> AppState {
        let api_url = url::Url::parse("http://127.0.0.1:9/").unwrap();
        AppState::new(StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 3000,
            api_public_url: api_url.clone(),
            api_url,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_bad_gateway() {
        let response = app(test_state())
            .oneshot(Request::get("/shop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
