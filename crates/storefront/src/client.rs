//! HTTP client for the shop API.
//!
//! The storefront owns no data; every page is rendered from API responses.
//! The category list changes rarely and is cached via `moka` (5-minute TTL).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use corona_core::{CategoryId, ProductId};

/// Errors that can occur when calling the shop API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error body.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// An endpoint URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// A product as listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: CategoryRef,
    pub quantity: i32,
    pub sold: i32,
    pub shipping: bool,
    #[serde(default)]
    pub has_photo: bool,
}

/// The category a product belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// A category as listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Body of `POST /api/products/by/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopSearchRequest {
    pub filters: BTreeMap<&'static str, Vec<serde_json::Value>>,
    pub limit: i64,
    pub skip: i64,
}

/// Response of `POST /api/products/by/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub size: usize,
    pub data: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the shop API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    categories: Cache<(), Arc<Vec<Category>>>,
}

impl CatalogClient {
    /// Create a client for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url,
                categories,
            }),
        }
    }

    /// Products sorted by one field (`GET /api/products`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the API rejects it.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        sort_by: &str,
        order: &str,
        limit: i64,
    ) -> Result<Vec<Product>, ClientError> {
        let mut url = self.endpoint("api/products")?;
        url.query_pairs_mut()
            .append_pair("sortBy", sort_by)
            .append_pair("order", order)
            .append_pair("limit", &limit.to_string());

        self.send(self.inner.client.get(url)).await
    }

    /// All categories, cached.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the API rejects it.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ClientError> {
        if let Some(cached) = self.inner.categories.get(&()).await {
            return Ok(cached);
        }

        let url = self.endpoint("api/categories")?;
        let categories: Arc<Vec<Category>> =
            Arc::new(self.send(self.inner.client.get(url)).await?);
        self.inner.categories.insert((), Arc::clone(&categories)).await;

        Ok(categories)
    }

    /// Name search, optionally within one category (`GET /api/products/search`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the API rejects it.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        text: &str,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, ClientError> {
        let mut url = self.endpoint("api/products/search")?;
        url.query_pairs_mut()
            .append_pair("search", text)
            .append_pair(
                "category",
                &category.map_or_else(|| "All".to_owned(), |id| id.to_string()),
            );

        self.send(self.inner.client.get(url)).await
    }

    /// Filtered page of products (`POST /api/products/by/search`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails or the API rejects it.
    #[instrument(skip(self, request), fields(skip = request.skip, limit = request.limit))]
    pub async fn list_by_search(
        &self,
        request: &ShopSearchRequest,
    ) -> Result<SearchResponse, ClientError> {
        let url = self.endpoint("api/products/by/search")?;
        self.send(self.inner.client.post(url).json(request)).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map_or_else(|_| status.to_string(), |body| body.error);
            tracing::warn!(status = %status, message = %message, "API returned an error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// Browser-facing URL of a product photo.
#[must_use]
pub fn photo_url(api_public_url: &Url, id: ProductId) -> Option<String> {
    api_public_url
        .join(&format!("api/product/photo/{id}"))
        .ok()
        .map(String::from)
}
