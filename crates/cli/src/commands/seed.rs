//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Masks
//!     products:
//!       - name: N95 Mask
//!         description: Five-layer respirator
//!         price: "12.50"
//!         quantity: 100
//!         shipping: true
//! ```
//!
//! Categories are matched by name and created when missing. Every product is
//! validated with the same rules as the create endpoint.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use corona_api::catalog::{NewProduct, ProductFields, ValidationError};
use corona_api::db::{CategoryRepository, ProductRepository};
use corona_api::models::Category;
use corona_core::CategoryId;

/// Top level of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

/// A category and the products to add to it.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default = "default_shipping")]
    pub shipping: bool,
}

const fn default_shipping() -> bool {
    true
}

/// A seed entry that failed validation.
#[derive(Debug, Error)]
#[error("product '{product}' in '{category}': {source}")]
pub struct SeedError {
    category: String,
    product: String,
    source: ValidationError,
}

impl ProductSeed {
    /// Validate the entry as if it had been submitted to the create endpoint.
    fn to_new_product(&self, category: CategoryId) -> Result<NewProduct, ValidationError> {
        let mut fields = ProductFields::default();
        fields.insert("name", self.name.as_str());
        fields.insert("description", self.description.as_str());
        fields.insert("price", self.price.to_string());
        fields.insert("category", category.to_string());
        fields.insert("quantity", self.quantity.to_string());
        fields.insert("shipping", self.shipping.to_string());
        NewProduct::from_fields(fields)
    }
}

/// Validate every product in the seed before anything is written.
///
/// Placeholder category ids are used; only field values are checked.
fn validate(seed: &CatalogSeed) -> Vec<SeedError> {
    seed.categories
        .iter()
        .flat_map(|category| {
            category.products.iter().filter_map(move |product| {
                product
                    .to_new_product(CategoryId::new(1))
                    .err()
                    .map(|source| SeedError {
                        category: category.name.clone(),
                        product: product.name.clone(),
                        source,
                    })
            })
        })
        .collect()
}

/// Seed categories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry fails
/// validation, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        for err in &errors {
            warn!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let existing = categories.list().await?;
    let mut created_categories = 0_usize;
    let mut created_products = 0_usize;

    for category_seed in &seed.categories {
        let category = match find_category(&existing, &category_seed.name) {
            Some(category) => category.clone(),
            None => {
                created_categories += 1;
                categories.create(category_seed.name.trim()).await?
            }
        };

        for product_seed in &category_seed.products {
            let product = product_seed.to_new_product(category.id)?;
            products.create(&product).await?;
            created_products += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Categories created: {created_categories}");
    info!("  Products created: {created_products}");
    Ok(())
}

fn find_category<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    let name = name.trim();
    categories.iter().find(|c| c.name == name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r#"
categories:
  - name: Masks
    products:
      - name: N95 Mask
        description: Five-layer respirator
        price: "12.50"
        quantity: 100
      - name: Cloth Mask
        description: Washable
        price: 4
        quantity: 20
        shipping: false
"#;

    #[test]
    fn test_parse_seed() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.categories.len(), 1);
        let products = &seed.categories[0].products;
        assert_eq!(products.len(), 2);
        assert!(products[0].shipping);
        assert!(!products[1].shipping);
        assert_eq!(products[0].price, Decimal::new(1250, 2));
    }

    #[test]
    fn test_valid_seed_has_no_errors() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_validate_reports_bad_entries() {
        let seed: CatalogSeed = serde_yaml::from_str(
            r#"
categories:
  - name: Masks
    products:
      - name: Broken
        description: Negative stock
        price: "1.00"
        quantity: -1
"#,
        )
        .unwrap();

        let errors = validate(&seed);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Broken"));
    }
}
