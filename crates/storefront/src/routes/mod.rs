//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /          - Best sellers, new arrivals and the search form
//! GET  /shop      - Category and price filters with paged results
//! GET  /search    - Name search within a category
//! GET  /health    - Health check
//! ```

pub mod home;
pub mod search;
pub mod shop;

use axum::{Router, routing::get};
use url::Url;

use crate::client::{Category, Product, photo_url};
use crate::state::AppState;

/// A product as rendered in a card.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category_name: String,
    pub photo_url: Option<String>,
    pub in_stock: bool,
}

impl ProductCard {
    fn new(product: Product, api_public_url: &Url) -> Self {
        Self {
            photo_url: product
                .has_photo
                .then(|| photo_url(api_public_url, product.id))
                .flatten(),
            name: product.name,
            description: product.description,
            price: product.price.to_string(),
            category_name: product.category.name,
            in_stock: product.quantity > 0,
        }
    }

    fn from_products(products: Vec<Product>, api_public_url: &Url) -> Vec<Self> {
        products
            .into_iter()
            .map(|p| Self::new(p, api_public_url))
            .collect()
    }
}

/// One entry of the search form's category dropdown.
#[derive(Debug, Clone)]
pub struct CategoryChoice {
    pub value: String,
    pub name: String,
    pub selected: bool,
}

/// Dropdown entries: `All` followed by every category.
fn category_choices(
    categories: &[Category],
    selected: Option<corona_core::CategoryId>,
) -> Vec<CategoryChoice> {
    std::iter::once(CategoryChoice {
        value: "All".to_owned(),
        name: "All".to_owned(),
        selected: selected.is_none(),
    })
    .chain(categories.iter().map(|c| CategoryChoice {
        value: c.id.to_string(),
        name: c.name.clone(),
        selected: selected == Some(c.id),
    }))
    .collect()
}

/// Create the storefront page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/shop", get(shop::shop))
        .route("/search", get(search::search))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corona_core::{CategoryId, ProductId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::client::CategoryRef;

    fn product(has_photo: bool, quantity: i32) -> Product {
        Product {
            id: ProductId::new(5),
            name: "Mask".to_owned(),
            description: "N95".to_owned(),
            price: Decimal::new(1000, 2),
            category: CategoryRef {
                id: CategoryId::new(1),
                name: "Masks".to_owned(),
            },
            quantity,
            sold: 0,
            shipping: true,
            has_photo,
        }
    }

    #[test]
    fn test_product_card_photo_only_when_present() {
        let base = Url::parse("http://localhost:8000/").unwrap();
        let card = ProductCard::new(product(true, 3), &base);
        assert_eq!(
            card.photo_url.as_deref(),
            Some("http://localhost:8000/api/product/photo/5")
        );
        assert!(card.in_stock);

        let card = ProductCard::new(product(false, 0), &base);
        assert!(card.photo_url.is_none());
        assert!(!card.in_stock);
    }

    #[test]
    fn test_category_choices_mark_selection() {
        let categories = vec![
            Category {
                id: CategoryId::new(1),
                name: "Masks".to_owned(),
            },
            Category {
                id: CategoryId::new(2),
                name: "Gloves".to_owned(),
            },
        ];

        let choices = category_choices(&categories, Some(CategoryId::new(2)));
        let selected: Vec<&str> = choices
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(choices.len(), 3);
        assert_eq!(selected, vec!["2"]);

        let choices = category_choices(&categories, None);
        assert!(choices.first().unwrap().selected);
    }
}
