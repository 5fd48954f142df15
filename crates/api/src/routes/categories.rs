//! Category route handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Deserialize;
use tracing::instrument;

use corona_core::CategoryId;

use super::{MessageResponse, path_id};
use crate::catalog::{MAX_NAME_LENGTH, ValidationError};
use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Category;
use crate::state::AppState;

const CATEGORY_NOT_FOUND: &str = "Category not found";

/// Body of category create and rename requests.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
}

impl CategoryRequest {
    /// The trimmed name, if it is present and short enough.
    fn validated_name(&self) -> std::result::Result<&str, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "name",
                reason: "cannot be empty".to_owned(),
            });
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::InvalidField {
                field: "name",
                reason: format!("must be at most {MAX_NAME_LENGTH} characters"),
            });
        }
        Ok(name)
    }
}

/// Create a category.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: std::result::Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<Category>> {
    let Json(request) = body?;
    let name = request.validated_name()?;

    let category = CategoryRepository::new(state.pool()).create(name).await?;
    tracing::info!(category_id = %category.id, "Category created");

    Ok(Json(category))
}

/// Get a category.
#[instrument(skip(state))]
pub async fn read(
    State(state): State<AppState>,
    path: std::result::Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<Category>> {
    let id = path_id(path, CATEGORY_NOT_FOUND)?;

    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_owned()))
}

/// Rename a category.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    path: std::result::Result<Path<CategoryId>, PathRejection>,
    body: std::result::Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<Category>> {
    let id = path_id(path, CATEGORY_NOT_FOUND)?;
    let Json(request) = body?;
    let name = request.validated_name()?;

    CategoryRepository::new(state.pool())
        .update(id, name)
        .await
        .map(Json)
        .map_err(not_found)
}

/// Delete a category no product uses.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    path: std::result::Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let id = path_id(path, CATEGORY_NOT_FOUND)?;

    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found)?;
    tracing::info!(category_id = %id, "Category deleted");

    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

/// All categories, ordered by name.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(CATEGORY_NOT_FOUND.to_owned()),
        other => other.into(),
    }
}
