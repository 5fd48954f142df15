//! Product domain types.
//!
//! Photo bytes are never part of [`Product`]; they are served separately by
//! the photo endpoint.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use corona_core::ProductId;

use super::CategorySummary;

/// A catalog product with its category populated.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: CategorySummary,
    pub quantity: i32,
    pub sold: i32,
    pub shipping: bool,
    /// Whether a photo can be fetched from `/api/product/photo/{id}`.
    pub has_photo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An uploaded product photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl Photo {
    /// Size of the photo in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the upload carried no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
