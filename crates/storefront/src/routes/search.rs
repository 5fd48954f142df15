//! Search page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use super::{CategoryChoice, ProductCard, category_choices};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::ui::SearchForm;

/// Submitted search form.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub text: String,
    pub categories: Vec<CategoryChoice>,
    pub message: Option<String>,
    pub results: Vec<ProductCard>,
}

/// Run a search when the form carries text, then render the form and
/// whatever was found.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<SearchTemplate> {
    let client = state.client();
    let mut form = SearchForm::new(query.search.as_deref(), query.category.as_deref());

    let categories = client.categories().await?;

    let results = if form.should_search() {
        let products = client.search_products(&form.text, form.category).await?;
        form.record_results(products.len());
        ProductCard::from_products(products, &state.config().api_public_url)
    } else {
        Vec::new()
    };

    Ok(SearchTemplate {
        categories: category_choices(&categories, form.category),
        message: form.message(),
        text: form.text,
        results,
    })
}
