//! Product catalog route handlers.

use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use corona_core::{CategoryId, ProductId};

use super::{MessageResponse, path_id};
use crate::catalog::{
    ListParams, ListQuery, NewProduct, ProductFields, ProductPatch, RelatedQuery,
    SearchRequest, TextSearchQuery,
};
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Photo, Product};
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Multipart field carrying the photo file.
const PHOTO_FIELD: &str = "photo";

/// Response of `POST /api/products/by/search`.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub size: usize,
    pub data: Vec<Product>,
}

/// Create a product from a multipart form.
#[instrument(skip(admin, state, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>> {
    let fields = read_product_form(multipart?).await?;
    let product = NewProduct::from_fields(fields)?;

    let product = ProductRepository::new(state.pool()).create(&product).await?;
    tracing::info!(product_id = %product.id, "Product created");

    Ok(Json(product))
}

/// Get a product with its category.
#[instrument(skip(state))]
pub async fn read(
    State(state): State<AppState>,
    path: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>> {
    let id = path_id(path, PRODUCT_NOT_FOUND)?;
    Ok(Json(load_product(state.pool(), id).await?))
}

/// Update a product. Fields left out of the form keep their stored values.
#[instrument(skip(admin, state, multipart), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    path: std::result::Result<Path<ProductId>, PathRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>> {
    let id = path_id(path, PRODUCT_NOT_FOUND)?;
    let existing = load_product(state.pool(), id).await?;

    let patch = ProductPatch::from_fields(read_product_form(multipart?).await?)?;
    let product = ProductRepository::new(state.pool())
        .update(id, &patch.merge(&existing))
        .await?;
    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(product))
}

/// Delete a product.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    path: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let id = path_id(path, PRODUCT_NOT_FOUND)?;

    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()));
    }
    tracing::info!(product_id = %id, "Product deleted");

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// Serve a product's photo with its stored content type.
#[instrument(skip(state))]
pub async fn photo(
    State(state): State<AppState>,
    path: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Response> {
    let id = path_id(path, PRODUCT_NOT_FOUND)?;

    let photo = ProductRepository::new(state.pool())
        .get_photo(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()),
            other => other.into(),
        })?;

    Ok(match photo {
        Some(Photo { data, content_type }) => {
            ([(header::CONTENT_TYPE, content_type)], data).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// List products sorted by one field (defaults: id, ascending, 6).
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>> {
    let Query(query) = query?;
    let params = ListParams::from_query(&query)?;

    Ok(Json(ProductRepository::new(state.pool()).list(&params).await?))
}

/// List products in the same category as the given one, excluding it.
#[instrument(skip(state))]
pub async fn list_related(
    State(state): State<AppState>,
    path: std::result::Result<Path<ProductId>, PathRejection>,
    query: std::result::Result<Query<RelatedQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>> {
    let id = path_id(path, PRODUCT_NOT_FOUND)?;
    let Query(query) = query?;
    let limit = query.limit()?;

    let product = load_product(state.pool(), id).await?;
    let related = ProductRepository::new(state.pool())
        .list_related(&product, limit)
        .await?;

    Ok(Json(related))
}

/// Ids of the categories that have at least one product.
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryId>>> {
    Ok(Json(
        ProductRepository::new(state.pool())
            .distinct_categories()
            .await?,
    ))
}

/// Filtered, paginated listing for the shop page.
#[instrument(skip(state, body))]
pub async fn list_by_search(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>> {
    let Json(request) = body?;
    let params = request.into_params()?;

    let data = ProductRepository::new(state.pool())
        .list_by_search(&params)
        .await?;

    Ok(Json(SearchResponse {
        size: data.len(),
        data,
    }))
}

/// Search product names, optionally within one category.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    query: std::result::Result<Query<TextSearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>> {
    let Query(query) = query?;
    let Some(search) = query.into_search()? else {
        return Ok(Json(Vec::new()));
    };

    Ok(Json(ProductRepository::new(state.pool()).search(&search).await?))
}

async fn load_product(pool: &PgPool, id: ProductId) -> Result<Product> {
    ProductRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()))
}

/// Read every part of a product form. The `photo` part is kept as bytes,
/// every other part as text.
async fn read_product_form(mut multipart: Multipart) -> Result<ProductFields> {
    let mut fields = ProductFields::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == PHOTO_FIELD {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let data = field.bytes().await?;
            fields.set_photo(Photo {
                data: data.to_vec(),
                content_type,
            });
        } else {
            let value = field.text().await?;
            fields.insert(name, value);
        }
    }

    Ok(fields)
}
