//! Application state shared across handlers.

use std::sync::Arc;

use crate::client::CatalogClient;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    client: CatalogClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let client = CatalogClient::new(config.api_url.clone());
        Self {
            inner: Arc::new(AppStateInner { config, client }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shop API client.
    #[must_use]
    pub fn client(&self) -> &CatalogClient {
        &self.inner.client
    }
}
