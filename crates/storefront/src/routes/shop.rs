//! Shop page route handler.
//!
//! Filter state travels in the query string (see [`ShopFilters`]); every
//! checkbox and radio is a link to the state it would produce.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{RawQuery, State};
use tracing::instrument;

use super::ProductCard;
use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::ui::{PRICE_RANGES, ShopFilters};

/// A filter control rendered as a link.
#[derive(Debug, Clone)]
pub struct FilterLink {
    pub name: String,
    pub checked: bool,
    pub href: String,
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop.html")]
pub struct ShopTemplate {
    pub categories: Vec<FilterLink>,
    pub prices: Vec<FilterLink>,
    pub products: Vec<ProductCard>,
    pub size: usize,
    pub load_more: Option<String>,
}

fn shop_href(filters: &ShopFilters) -> String {
    let query = filters.query_string();
    if query.is_empty() {
        "/shop".to_owned()
    } else {
        format!("/shop?{query}")
    }
}

/// Display one page of filtered products.
#[instrument(skip(state))]
pub async fn shop(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<ShopTemplate> {
    let filters = ShopFilters::from_query(query.as_deref());
    let client = state.client();

    let request = filters.to_request();
    let (categories, page) = tokio::try_join!(
        client.categories(),
        client.list_by_search(&request),
    )?;

    let category_links = categories
        .iter()
        .map(|c| FilterLink {
            name: c.name.clone(),
            checked: filters.categories.contains(c.id),
            href: shop_href(&filters.with_category_toggled(c.id)),
        })
        .collect();

    let price_links = PRICE_RANGES
        .iter()
        .map(|range| FilterLink {
            name: range.name.to_owned(),
            checked: filters.price == range.id,
            href: shop_href(&filters.with_price(range.id)),
        })
        .collect();

    // A full page means there may be more
    let load_more = (i64::try_from(page.size).unwrap_or(i64::MAX) >= filters.limit)
        .then(|| shop_href(&filters.next_page()));

    Ok(ShopTemplate {
        categories: category_links,
        prices: price_links,
        size: page.size,
        products: ProductCard::from_products(page.data, &state.config().api_public_url),
        load_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_href() {
        assert_eq!(shop_href(&ShopFilters::default()), "/shop");
        let filters = ShopFilters::from_query(Some("price=2"));
        assert_eq!(shop_href(&filters), "/shop?price=2");
    }
}
