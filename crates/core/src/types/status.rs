//! Order status.

use serde::{Deserialize, Serialize};

/// Fulfilment status of an order.
///
/// Serialized with the human-readable labels the storefront and admin
/// screens display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Not processed")]
    NotProcessed,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Shipped")]
    Shipped,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Every status, in fulfilment order.
    pub const ALL: [Self; 5] = [
        Self::NotProcessed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Display label (same as the serialized form).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotProcessed => "Not processed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_form_matches_label() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.label()));
        }
    }

    #[test]
    fn test_deserialize_label() {
        let status: OrderStatus = serde_json::from_str("\"Shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
    }
}
