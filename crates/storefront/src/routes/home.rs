//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use super::{CategoryChoice, ProductCard, category_choices};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Products per home page row.
const ROW_SIZE: i64 = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub best_sellers: Vec<ProductCard>,
    pub new_arrivals: Vec<ProductCard>,
    pub categories: Vec<CategoryChoice>,
    /// Search box contents; always empty on the home page.
    pub text: String,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let client = state.client();
    let base = &state.config().api_public_url;

    let (best_sellers, new_arrivals, categories) = tokio::try_join!(
        client.list_products("sold", "desc", ROW_SIZE),
        client.list_products("createdAt", "desc", ROW_SIZE),
        client.categories(),
    )?;

    Ok(HomeTemplate {
        best_sellers: ProductCard::from_products(best_sellers, base),
        new_arrivals: ProductCard::from_products(new_arrivals, base),
        categories: category_choices(&categories, None),
        text: String::new(),
    })
}
