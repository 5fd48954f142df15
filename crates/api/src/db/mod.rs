//! Database operations for the shop `PostgreSQL` database.
//!
//! # Schema: `shop`
//!
//! - `category` - Product categories (unique names)
//! - `product` - Catalog entries, photo bytes stored inline
//! - `user` - Accounts with salted HMAC credentials and purchase history
//! - `order` / `order_line` - Checkouts and their line items
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p corona-cli -- migrate
//! ```

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::error::ErrorKind;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A quantity decrement could not be applied to every line of a batch.
    #[error("insufficient stock for {failed} of {requested} order lines")]
    StockUnavailable {
        /// Lines in the batch.
        requested: usize,
        /// Lines that were rejected.
        failed: usize,
    },
}

impl RepositoryError {
    /// Whether the request itself caused the error (a constraint violation,
    /// a missing row, short stock) as opposed to a store failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db_err)) => matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::CheckViolation
                    | ErrorKind::NotNullViolation
            ),
            Self::Database(sqlx::Error::RowNotFound)
            | Self::NotFound
            | Self::Conflict(_)
            | Self::StockUnavailable { .. } => true,
            Self::Database(_) => false,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Format a store-level error as a message fit for API clients.
///
/// Constraint violations are described by the column they concern; anything
/// else collapses to a generic message so driver internals never leak.
#[must_use]
pub fn db_error_message(error: &RepositoryError) -> String {
    match error {
        RepositoryError::Database(sqlx::Error::Database(db_err)) => {
            if db_err.is_unique_violation() {
                let field = db_err
                    .constraint()
                    .map_or("Record", constraint_field);
                return format!("{} already exists", capitalize(field));
            }
            if db_err.is_foreign_key_violation() {
                return "Referenced record does not exist".to_owned();
            }
            if db_err.is_check_violation() {
                return "Value out of range".to_owned();
            }
            "Something went wrong".to_owned()
        }
        RepositoryError::Database(sqlx::Error::RowNotFound) | RepositoryError::NotFound => {
            "Record not found".to_owned()
        }
        RepositoryError::Conflict(message) => message.clone(),
        RepositoryError::StockUnavailable { .. } => "Could not update product".to_owned(),
        RepositoryError::Database(_) => "Something went wrong".to_owned(),
    }
}

/// Extract the column name from a `PostgreSQL` constraint name.
///
/// Default constraint names follow `<table>_<column>_key`, so
/// `user_email_key` yields `email` and `order_transaction_id_key` yields
/// `transaction_id`.
fn constraint_field(constraint: &str) -> &str {
    let trimmed = constraint
        .strip_suffix("_key")
        .or_else(|| constraint.strip_suffix("_fkey"))
        .or_else(|| constraint.strip_suffix("_check"))
        .unwrap_or(constraint);

    for table in ["order_line_", "category_", "product_", "order_", "user_"] {
        if let Some(column) = trimmed.strip_prefix(table) {
            return column;
        }
    }
    trimmed
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
