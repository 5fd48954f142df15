//! HTTP route handlers for the shop API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/signup                         - Create a customer account
//! POST /api/signin                         - Sign in (session cookie)
//! POST /api/signout                        - Sign out
//!
//! # Users (self or admin)
//! GET  /api/user/{user_id}                 - Profile with purchase history
//! PUT  /api/user/{user_id}                 - Update name, about, password
//! GET  /api/orders/by/user/{user_id}       - The user's orders
//!
//! # Categories
//! POST /api/category/create                - Create (admin)
//! GET  /api/category/{category_id}         - Read
//! PUT  /api/category/{category_id}         - Rename (admin)
//! DELETE /api/category/{category_id}       - Delete (admin)
//! GET  /api/categories                     - All categories
//!
//! # Products
//! POST /api/product/create                 - Create, multipart (admin)
//! GET  /api/product/{product_id}           - Read
//! PUT  /api/product/{product_id}           - Update, multipart (admin)
//! DELETE /api/product/{product_id}         - Delete (admin)
//! GET  /api/product/photo/{product_id}     - Photo bytes
//! GET  /api/products                       - Sorted listing
//! GET  /api/products/related/{product_id}  - Same-category products
//! GET  /api/products/categories            - Category ids in use
//! POST /api/products/by/search             - Filtered, paginated listing
//! GET  /api/products/search                - Name search
//!
//! # Orders
//! POST /api/order/create                   - Checkout (signed in)
//! GET  /api/order/list                     - All orders (admin)
//! GET  /api/order/status-values            - Order statuses (admin)
//! PUT  /api/order/{order_id}/status        - Set status (admin)
//! ```

pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::{Path, rejection::PathRejection},
    routing::{get, post, put},
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Body of responses that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Resolve a path id, reporting a malformed one the same way as an unknown one.
fn path_id<T>(path: std::result::Result<Path<T>, PathRejection>, not_found: &str) -> Result<T> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound(not_found.to_owned()))
}

/// Create the `/api` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/signout", post(auth::signout))
        // Users
        .route("/user/{user_id}", get(users::read).put(users::update))
        .route("/orders/by/user/{user_id}", get(users::purchase_history))
        // Categories
        .route("/category/create", post(categories::create))
        .route(
            "/category/{category_id}",
            get(categories::read)
                .put(categories::update)
                .delete(categories::remove),
        )
        .route("/categories", get(categories::list))
        // Products
        .route("/product/create", post(products::create))
        .route(
            "/product/{product_id}",
            get(products::read)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/product/photo/{product_id}", get(products::photo))
        .route("/products", get(products::list))
        .route("/products/related/{product_id}", get(products::list_related))
        .route("/products/categories", get(products::list_categories))
        .route("/products/by/search", post(products::list_by_search))
        .route("/products/search", get(products::search))
        // Orders
        .route("/order/create", post(orders::create))
        .route("/order/list", get(orders::list))
        .route("/order/status-values", get(orders::status_values))
        .route("/order/{order_id}/status", put(orders::update_status))
}
