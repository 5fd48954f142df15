//! Checkout request handling.
//!
//! Validates an order submitted by the storefront and folds repeated lines
//! for the same product into one, so each product is decremented once.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use corona_core::ProductId;

use crate::db::products::StockLine;

/// Errors raised while validating an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order must contain at least one product")]
    NoProducts,

    #[error("Product count must be positive")]
    InvalidCount,

    #[error("Transaction id is required")]
    MissingTransactionId,

    #[error("Address is required")]
    MissingAddress,

    #[error("Amount must not be negative")]
    NegativeAmount,
}

/// Body of `POST /api/order/create`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub order: OrderInput,
}

/// The order as sent by the storefront.
#[derive(Debug, Deserialize)]
pub struct OrderInput {
    pub products: Vec<OrderLineInput>,
    pub transaction_id: String,
    pub amount: Decimal,
    pub address: String,
}

/// One cart line. Display fields the storefront sends along (name, price)
/// are ignored; the stored product is authoritative.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    #[serde(alias = "_id")]
    pub product_id: ProductId,
    pub count: i32,
}

/// A validated order, ready to be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub lines: Vec<StockLine>,
    pub transaction_id: String,
    pub amount: Decimal,
    pub address: String,
}

impl OrderInput {
    /// Validate the order and coalesce its lines.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderError`] the input violates.
    pub fn validate(self) -> Result<NewOrder, OrderError> {
        if self.products.is_empty() {
            return Err(OrderError::NoProducts);
        }
        if self.products.iter().any(|line| line.count <= 0) {
            return Err(OrderError::InvalidCount);
        }

        let transaction_id = self.transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(OrderError::MissingTransactionId);
        }
        let address = self.address.trim();
        if address.is_empty() {
            return Err(OrderError::MissingAddress);
        }
        if self.amount.is_sign_negative() {
            return Err(OrderError::NegativeAmount);
        }

        Ok(NewOrder {
            lines: coalesce_lines(&self.products),
            transaction_id: transaction_id.to_owned(),
            amount: self.amount,
            address: address.to_owned(),
        })
    }
}

/// Sum the counts of lines naming the same product, keeping the order in
/// which products first appear.
#[must_use]
pub fn coalesce_lines(lines: &[OrderLineInput]) -> Vec<StockLine> {
    let mut merged: Vec<StockLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.count = existing.count.saturating_add(line.count),
            None => merged.push(StockLine {
                product_id: line.product_id,
                count: line.count,
            }),
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line(id: i32, count: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: ProductId::new(id),
            count,
        }
    }

    #[test]
    fn test_coalesce_sums_repeated_products() {
        let merged = coalesce_lines(&[line(3, 1), line(1, 2), line(3, 4)]);
        assert_eq!(
            merged,
            vec![
                StockLine {
                    product_id: ProductId::new(3),
                    count: 5
                },
                StockLine {
                    product_id: ProductId::new(1),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_request_accepts_storefront_cart_shape() {
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "order": {
                "products": [
                    {"_id": 7, "name": "Mask", "price": 10, "count": 2}
                ],
                "transaction_id": "txn_123",
                "amount": 20,
                "address": "1 Main St"
            }
        }))
        .unwrap();

        let order = request.order.validate().unwrap();
        assert_eq!(order.lines, vec![StockLine {
            product_id: ProductId::new(7),
            count: 2
        }]);
        assert_eq!(order.amount, Decimal::from(20));
        assert_eq!(order.transaction_id, "txn_123");
    }

    #[test]
    fn test_validate_rejects_bad_orders() {
        let order = |products: Vec<OrderLineInput>, txn: &str, address: &str, amount: i64| {
            OrderInput {
                products,
                transaction_id: txn.to_owned(),
                amount: Decimal::from(amount),
                address: address.to_owned(),
            }
            .validate()
        };

        assert_eq!(order(vec![], "t", "a", 1), Err(OrderError::NoProducts));
        assert_eq!(
            order(vec![line(1, 0)], "t", "a", 1),
            Err(OrderError::InvalidCount)
        );
        assert_eq!(
            order(vec![line(1, 1)], " ", "a", 1),
            Err(OrderError::MissingTransactionId)
        );
        assert_eq!(
            order(vec![line(1, 1)], "t", "", 1),
            Err(OrderError::MissingAddress)
        );
        assert_eq!(
            order(vec![line(1, 1)], "t", "a", -1),
            Err(OrderError::NegativeAmount)
        );
    }
}
