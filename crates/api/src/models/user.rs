//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corona_core::{Email, ProductId, Role, UserId};

/// A shop user (domain type).
///
/// Credential material (salt and hash) is not part of this type; it is only
/// ever loaded by [`crate::db::UserRepository::get_credentials_by_email`].
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub about: Option<String>,
    pub role: Role,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One purchased line in a user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Product bought. `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub transaction_id: String,
    pub amount: Decimal,
    pub purchased_at: DateTime<Utc>,
}
