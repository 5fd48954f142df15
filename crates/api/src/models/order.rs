//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corona_core::{OrderId, OrderStatus, ProductId, UserId};

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Name of the ordering user, for admin listings.
    pub user_name: String,
    pub products: Vec<OrderLine>,
    pub transaction_id: String,
    pub amount: Decimal,
    pub address: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order, with name and price as they were at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Decimal,
    pub count: i32,
}
