//! Checkout and order management handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Deserialize;
use tracing::instrument;

use corona_core::{OrderId, OrderStatus};

use super::path_id;
use crate::checkout::CreateOrderRequest;
use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Order;
use crate::state::AppState;

const ORDER_NOT_FOUND: &str = "Order not found";

/// Body of `PUT /api/order/{order_id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Place an order for the signed-in user.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let Json(request) = body?;
    let order = request.order.validate()?;

    let order = OrderRepository::new(state.pool())
        .create(user.id, &order)
        .await?;

    Ok(Json(order))
}

/// All orders, newest first.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list_all().await?))
}

/// The statuses an order can be moved to.
pub async fn status_values(RequireAdmin(_admin): RequireAdmin) -> Json<Vec<OrderStatus>> {
    Json(OrderStatus::ALL.to_vec())
}

/// Move an order to a new status.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    path: std::result::Result<Path<OrderId>, PathRejection>,
    body: std::result::Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let id = path_id(path, ORDER_NOT_FOUND)?;
    let Json(request) = body?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, request.status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(ORDER_NOT_FOUND.to_owned()),
            other => other.into(),
        })?;
    tracing::info!(order_id = %order.id, status = %order.status.label(), "Order status updated");

    Ok(Json(order))
}
