//! Filter and search state of the storefront pages.
//!
//! Pages are server-rendered, so this state lives in the query string: each
//! control links to the URL of the state it would produce.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use url::form_urlencoded;

use corona_core::CategoryId;

use crate::client::ShopSearchRequest;

/// Products per shop page.
pub const SHOP_PAGE_SIZE: i64 = 6;

/// The categories ticked in the shop sidebar, in the order they were ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    ids: Vec<CategoryId>,
}

impl CategorySelection {
    /// Build a selection, dropping repeated ids.
    pub fn from_ids(ids: impl IntoIterator<Item = CategoryId>) -> Self {
        let mut selection = Self::default();
        for id in ids {
            if !selection.contains(id) {
                selection.ids.push(id);
            }
        }
        selection
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: CategoryId) {
        match self.ids.iter().position(|&c| c == id) {
            Some(index) => {
                self.ids.remove(index);
            }
            None => self.ids.push(id),
        }
    }

    /// The selection after toggling `id`.
    #[must_use]
    pub fn toggled(&self, id: CategoryId) -> Self {
        let mut next = self.clone();
        next.toggle(id);
        next
    }

    #[must_use]
    pub fn contains(&self, id: CategoryId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn ids(&self) -> &[CategoryId] {
        &self.ids
    }
}

/// A named price bracket of the shop sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub id: u8,
    pub name: &'static str,
    /// Inclusive `[min, max]`; `None` means any price.
    pub bounds: Option<(i64, i64)>,
}

/// Price brackets offered on the shop page.
pub const PRICE_RANGES: [PriceRange; 6] = [
    PriceRange {
        id: 0,
        name: "Any",
        bounds: None,
    },
    PriceRange {
        id: 1,
        name: "$0 to $9",
        bounds: Some((0, 9)),
    },
    PriceRange {
        id: 2,
        name: "$10 to $19",
        bounds: Some((10, 19)),
    },
    PriceRange {
        id: 3,
        name: "$20 to $29",
        bounds: Some((20, 29)),
    },
    PriceRange {
        id: 4,
        name: "$30 to $39",
        bounds: Some((30, 39)),
    },
    PriceRange {
        id: 5,
        name: "More",
        bounds: Some((40, 9_999_999)),
    },
];

/// Look up a price bracket by id.
#[must_use]
pub fn price_range(id: u8) -> Option<&'static PriceRange> {
    PRICE_RANGES.iter().find(|range| range.id == id)
}

/// Full filter state of the shop page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopFilters {
    pub categories: CategorySelection,
    pub price: u8,
    pub limit: i64,
    pub skip: i64,
}

impl Default for ShopFilters {
    fn default() -> Self {
        Self {
            categories: CategorySelection::default(),
            price: 0,
            limit: SHOP_PAGE_SIZE,
            skip: 0,
        }
    }
}

impl ShopFilters {
    /// Read the state from a raw query string such as
    /// `category=1&category=4&price=2&skip=6`. Unknown or malformed values
    /// fall back to defaults.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let mut filters = Self::default();
        let mut categories = Vec::new();

        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "category" => categories.extend(value.parse::<CategoryId>().ok()),
                "price" => {
                    if let Some(range) = value.parse().ok().and_then(price_range) {
                        filters.price = range.id;
                    }
                }
                "skip" => {
                    if let Ok(skip) = value.parse::<i64>() {
                        filters.skip = skip.max(0);
                    }
                }
                _ => {}
            }
        }

        filters.categories = CategorySelection::from_ids(categories);
        filters
    }

    /// The API request for this state. An empty selection or the `Any`
    /// bracket sends an empty array, which the API ignores.
    #[must_use]
    pub fn to_request(&self) -> ShopSearchRequest {
        let category: Vec<Value> = self.categories.ids().iter().map(|id| json!(id)).collect();
        let price: Vec<Value> = price_range(self.price)
            .and_then(|range| range.bounds)
            .map(|(min, max)| vec![json!(min), json!(max)])
            .unwrap_or_default();

        let mut filters = BTreeMap::new();
        filters.insert("category", category);
        filters.insert("price", price);

        ShopSearchRequest {
            filters,
            limit: self.limit,
            skip: self.skip,
        }
    }

    /// Query string for this state.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for id in self.categories.ids() {
            query.append_pair("category", &id.to_string());
        }
        if self.price != 0 {
            query.append_pair("price", &self.price.to_string());
        }
        if self.skip > 0 {
            query.append_pair("skip", &self.skip.to_string());
        }
        query.finish()
    }

    /// State after toggling a category. Changing a filter starts over at the
    /// first page.
    #[must_use]
    pub fn with_category_toggled(&self, id: CategoryId) -> Self {
        Self {
            categories: self.categories.toggled(id),
            skip: 0,
            ..self.clone()
        }
    }

    /// State after choosing a price bracket.
    #[must_use]
    pub fn with_price(&self, price: u8) -> Self {
        Self {
            price,
            skip: 0,
            ..self.clone()
        }
    }

    /// State of the "load more" link.
    #[must_use]
    pub fn next_page(&self) -> Self {
        Self {
            skip: self.skip + self.limit,
            ..self.clone()
        }
    }
}

/// State of the search form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub text: String,
    pub category: Option<CategoryId>,
    searched: bool,
    result_count: usize,
}

impl SearchForm {
    /// Read the form from its submitted values. A category of `All` (or
    /// anything that is not an id) searches everywhere.
    #[must_use]
    pub fn new(text: Option<&str>, category: Option<&str>) -> Self {
        Self {
            text: text.unwrap_or_default().trim().to_owned(),
            category: category.and_then(|c| c.parse().ok()),
            searched: false,
            result_count: 0,
        }
    }

    /// Whether submitting should issue a search request.
    #[must_use]
    pub fn should_search(&self) -> bool {
        !self.text.is_empty()
    }

    /// Record the outcome of a search.
    pub fn record_results(&mut self, count: usize) {
        self.searched = true;
        self.result_count = count;
    }

    /// The heading shown above results, once a search has run.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        if !self.searched {
            return None;
        }
        Some(if self.result_count > 0 {
            format!("Found {} products", self.result_count)
        } else {
            "No products found".to_owned()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ids(values: &[i32]) -> Vec<CategoryId> {
        values.iter().copied().map(CategoryId::new).collect()
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut selection = CategorySelection::default();
        selection.toggle(CategoryId::new(3));
        selection.toggle(CategoryId::new(1));
        assert_eq!(selection.ids(), ids(&[3, 1]).as_slice());

        selection.toggle(CategoryId::new(3));
        assert_eq!(selection.ids(), ids(&[1]).as_slice());
    }

    #[test]
    fn test_toggle_preserves_selection_order() {
        let selection = CategorySelection::from_ids(ids(&[5, 2, 7]));
        let next = selection.toggled(CategoryId::new(2)).toggled(CategoryId::new(9));
        assert_eq!(next.ids(), ids(&[5, 7, 9]).as_slice());
        // toggled leaves the original alone
        assert_eq!(selection.ids(), ids(&[5, 2, 7]).as_slice());
    }

    #[test]
    fn test_from_ids_drops_duplicates() {
        let selection = CategorySelection::from_ids(ids(&[1, 2, 1]));
        assert_eq!(selection.ids(), ids(&[1, 2]).as_slice());
    }

    #[test]
    fn test_price_ranges_are_addressable_by_id() {
        for (index, range) in PRICE_RANGES.iter().enumerate() {
            assert_eq!(usize::from(range.id), index);
        }
        assert!(price_range(0).unwrap().bounds.is_none());
        assert_eq!(price_range(2).unwrap().bounds, Some((10, 19)));
        assert!(price_range(42).is_none());
    }

    #[test]
    fn test_shop_filters_from_query() {
        let filters = ShopFilters::from_query(Some("category=4&category=1&price=3&skip=12&x=y"));
        assert_eq!(filters.categories.ids(), ids(&[4, 1]).as_slice());
        assert_eq!(filters.price, 3);
        assert_eq!(filters.skip, 12);
        assert_eq!(filters.limit, SHOP_PAGE_SIZE);
    }

    #[test]
    fn test_shop_filters_ignore_malformed_values() {
        let filters = ShopFilters::from_query(Some("category=abc&price=99&skip=-5"));
        assert_eq!(filters, ShopFilters::default());
        assert_eq!(ShopFilters::from_query(None), ShopFilters::default());
    }

    #[test]
    fn test_to_request_forwards_filters() {
        let filters = ShopFilters::from_query(Some("category=2&price=2"));
        let request = filters.to_request();
        assert_eq!(request.filters["category"], vec![json!(2)]);
        assert_eq!(request.filters["price"], vec![json!(10), json!(19)]);
        assert_eq!(request.limit, SHOP_PAGE_SIZE);
        assert_eq!(request.skip, 0);
    }

    #[test]
    fn test_to_request_any_price_is_empty() {
        let request = ShopFilters::default().to_request();
        assert!(request.filters["price"].is_empty());
        assert!(request.filters["category"].is_empty());
    }

    #[test]
    fn test_filter_changes_reset_paging() {
        let filters = ShopFilters::from_query(Some("category=1&skip=12"));
        assert_eq!(filters.with_category_toggled(CategoryId::new(2)).skip, 0);
        assert_eq!(filters.with_price(1).skip, 0);
        assert_eq!(filters.next_page().skip, 12 + SHOP_PAGE_SIZE);
    }

    #[test]
    fn test_query_string_round_trips() {
        let filters = ShopFilters::from_query(Some("category=4&category=1&price=3&skip=6"));
        assert_eq!(filters.query_string(), "category=4&category=1&price=3&skip=6");
        assert_eq!(ShopFilters::default().query_string(), "");
    }

    #[test]
    fn test_search_form_skips_blank_text() {
        let form = SearchForm::new(Some("   "), Some("All"));
        assert!(!form.should_search());
        assert_eq!(form.category, None);
        assert_eq!(form.message(), None);
    }

    #[test]
    fn test_search_form_messages() {
        let mut form = SearchForm::new(Some("mask"), Some("2"));
        assert!(form.should_search());
        assert_eq!(form.category, Some(CategoryId::new(2)));

        form.record_results(3);
        assert_eq!(form.message().as_deref(), Some("Found 3 products"));

        form.record_results(0);
        assert_eq!(form.message().as_deref(), Some("No products found"));
    }
}
