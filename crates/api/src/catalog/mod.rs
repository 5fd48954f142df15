//! Product catalog input handling.
//!
//! Turns raw form fields and query parameters into validated values before
//! anything reaches the database. Every check here runs without I/O, so a
//! rejected request never causes a write.

pub mod query;

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use corona_core::CategoryId;

use crate::models::{Photo, Product};

pub use query::{
    CatalogFilter, ListParams, ListQuery, RelatedQuery, SearchParams, SearchRequest, SortField,
    SortOrder, TextSearch, TextSearchQuery, push_filters,
};

/// Largest accepted photo upload, in bytes.
pub const MAX_PHOTO_BYTES: usize = 1_000_000;

/// Maximum product name length, in characters.
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum product description length, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Form fields a new product must carry.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "name",
    "description",
    "price",
    "category",
    "quantity",
    "shipping",
];

/// Errors raised while validating catalog input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Image should be less than 1mb in size")]
    PhotoTooLarge,

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Cannot sort by '{0}'")]
    UnknownSortField(String),

    #[error("Invalid sort order '{0}'")]
    UnknownSortOrder(String),

    #[error("Cannot filter by '{0}'")]
    UnknownFilter(String),

    #[error("Price filter must be [min, max]")]
    InvalidPriceRange,

    #[error("Invalid value in '{0}' filter")]
    InvalidFilterValue(String),
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Raw multipart fields of a product create or update request.
#[derive(Debug, Clone, Default)]
pub struct ProductFields {
    values: HashMap<String, String>,
    photo: Option<Photo>,
}

impl ProductFields {
    /// Record a text field. A repeated field keeps its last value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Attach the uploaded photo. Empty uploads (a file input left blank)
    /// are ignored.
    pub fn set_photo(&mut self, photo: Photo) {
        if !photo.is_empty() {
            self.photo = Some(photo);
        }
    }

    /// A submitted, non-blank field value.
    fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Whether a field was submitted at all, blank or not.
    fn submitted(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn check_photo(&self) -> Result<(), ValidationError> {
        match &self.photo {
            Some(photo) if photo.len() > MAX_PHOTO_BYTES => Err(ValidationError::PhotoTooLarge),
            _ => Ok(()),
        }
    }
}

/// A fully validated product, ready to insert (or to overwrite an existing row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: CategoryId,
    pub quantity: i32,
    pub shipping: bool,
    /// New photo. `None` on update keeps the stored one.
    pub photo: Option<Photo>,
}

impl NewProduct {
    /// Validate the fields of a create request.
    ///
    /// Required fields are checked first, then the photo size, then each
    /// value's format.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] the input violates.
    pub fn from_fields(fields: ProductFields) -> Result<Self, ValidationError> {
        let mut required = [""; 6];
        for (slot, name) in required.iter_mut().zip(REQUIRED_FIELDS) {
            *slot = fields.get(name).ok_or(ValidationError::MissingFields)?;
        }
        fields.check_photo()?;

        let [name, description, price, category, quantity, shipping] = required;
        let name = parse_name(name)?;
        let description = parse_description(description)?;
        let price = parse_price(price)?;
        let category = parse_category(category)?;
        let quantity = parse_quantity(quantity)?;
        let shipping = parse_shipping(shipping)?;

        Ok(Self {
            name,
            description,
            price,
            category,
            quantity,
            shipping,
            photo: fields.photo,
        })
    }
}

/// The fields submitted with an update request.
///
/// Fields left out keep their stored values; fields present replace them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<CategoryId>,
    pub quantity: Option<i32>,
    pub shipping: Option<bool>,
    pub photo: Option<Photo>,
}

impl ProductPatch {
    /// Validate the fields of an update request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PhotoTooLarge`] for oversized photos, and
    /// [`ValidationError::InvalidField`] when a submitted field is blank or
    /// malformed.
    pub fn from_fields(fields: ProductFields) -> Result<Self, ValidationError> {
        fields.check_photo()?;

        Ok(Self {
            name: patch_field(&fields, "name", parse_name)?,
            description: patch_field(&fields, "description", parse_description)?,
            price: patch_field(&fields, "price", parse_price)?,
            category: patch_field(&fields, "category", parse_category)?,
            quantity: patch_field(&fields, "quantity", parse_quantity)?,
            shipping: patch_field(&fields, "shipping", parse_shipping)?,
            photo: fields.photo,
        })
    }

    /// Overlay the patch on an existing product.
    #[must_use]
    pub fn merge(self, existing: &Product) -> NewProduct {
        NewProduct {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            description: self
                .description
                .unwrap_or_else(|| existing.description.clone()),
            price: self.price.unwrap_or(existing.price),
            category: self.category.unwrap_or(existing.category.id),
            quantity: self.quantity.unwrap_or(existing.quantity),
            shipping: self.shipping.unwrap_or(existing.shipping),
            photo: self.photo,
        }
    }
}

fn patch_field<T>(
    fields: &ProductFields,
    name: &'static str,
    parse: fn(&str) -> Result<T, ValidationError>,
) -> Result<Option<T>, ValidationError> {
    if !fields.submitted(name) {
        return Ok(None);
    }
    let value = fields
        .get(name)
        .ok_or_else(|| ValidationError::invalid(name, "cannot be empty"))?;
    parse(value).map(Some)
}

fn parse_name(value: &str) -> Result<String, ValidationError> {
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::invalid(
            "name",
            format!("must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(value.to_owned())
}

fn parse_description(value: &str) -> Result<String, ValidationError> {
    if value.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::invalid(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        ));
    }
    Ok(value.to_owned())
}

/// Parse a price such as `"10"` or `"12.50"`.
pub(crate) fn parse_price(value: &str) -> Result<Decimal, ValidationError> {
    let price =
        Decimal::from_str(value).map_err(|_| ValidationError::invalid("price", "must be a number"))?;
    if price.is_sign_negative() {
        return Err(ValidationError::invalid("price", "must not be negative"));
    }
    // NUMERIC(12, 2) tops out at 9999999999.99
    if price > Decimal::new(999_999_999_999, 2) {
        return Err(ValidationError::invalid("price", "is too large"));
    }
    Ok(price.round_dp(2))
}

fn parse_category(value: &str) -> Result<CategoryId, ValidationError> {
    value
        .parse()
        .map_err(|_| ValidationError::invalid("category", "must be a category id"))
}

fn parse_quantity(value: &str) -> Result<i32, ValidationError> {
    let quantity: i32 = value
        .parse()
        .map_err(|_| ValidationError::invalid("quantity", "must be a whole number"))?;
    if quantity < 0 {
        return Err(ValidationError::invalid("quantity", "must not be negative"));
    }
    Ok(quantity)
}

/// Parse a form boolean. HTML forms and the admin UI send `true`/`false`
/// or `1`/`0`.
pub(crate) fn parse_shipping(value: &str) -> Result<bool, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::invalid("shipping", "must be true or false")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use corona_core::ProductId;

    use super::*;
    use crate::models::CategorySummary;

    fn mask_fields() -> ProductFields {
        let mut fields = ProductFields::default();
        fields.insert("name", "Mask");
        fields.insert("description", "N95");
        fields.insert("price", "10");
        fields.insert("category", "1");
        fields.insert("quantity", "100");
        fields.insert("shipping", "true");
        fields
    }

    fn photo(len: usize) -> Photo {
        Photo {
            data: vec![0; len],
            content_type: "image/png".to_owned(),
        }
    }

    fn stored_product() -> Product {
        Product {
            id: ProductId::new(9),
            name: "Gloves".to_owned(),
            description: "Nitrile".to_owned(),
            price: Decimal::new(499, 2),
            category: CategorySummary {
                id: CategoryId::new(2),
                name: "Protection".to_owned(),
            },
            quantity: 40,
            sold: 3,
            shipping: false,
            has_photo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_product_from_complete_fields() {
        let product = NewProduct::from_fields(mask_fields()).unwrap();
        assert_eq!(product.name, "Mask");
        assert_eq!(product.price, Decimal::from(10));
        assert_eq!(product.category, CategoryId::new(1));
        assert_eq!(product.quantity, 100);
        assert!(product.shipping);
        assert!(product.photo.is_none());
    }

    #[test]
    fn test_every_required_field_is_checked() {
        for missing in REQUIRED_FIELDS {
            let mut fields = mask_fields();
            fields.values.remove(missing);
            assert_eq!(
                NewProduct::from_fields(fields),
                Err(ValidationError::MissingFields),
                "missing {missing}"
            );

            let mut fields = mask_fields();
            fields.insert(missing, "  ");
            assert_eq!(
                NewProduct::from_fields(fields),
                Err(ValidationError::MissingFields),
                "blank {missing}"
            );
        }
    }

    #[test]
    fn test_zero_quantity_counts_as_present() {
        let mut fields = mask_fields();
        fields.insert("quantity", "0");
        assert_eq!(NewProduct::from_fields(fields).unwrap().quantity, 0);
    }

    #[test]
    fn test_missing_fields_reported_before_photo_size() {
        let mut fields = mask_fields();
        fields.values.remove("name");
        fields.set_photo(photo(MAX_PHOTO_BYTES + 1));
        assert_eq!(
            NewProduct::from_fields(fields),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn test_photo_size_limit() {
        let mut fields = mask_fields();
        fields.set_photo(photo(MAX_PHOTO_BYTES));
        assert!(NewProduct::from_fields(fields).unwrap().photo.is_some());

        let mut fields = mask_fields();
        fields.set_photo(photo(MAX_PHOTO_BYTES + 1));
        assert_eq!(
            NewProduct::from_fields(fields),
            Err(ValidationError::PhotoTooLarge)
        );
    }

    #[test]
    fn test_empty_photo_is_ignored() {
        let mut fields = mask_fields();
        fields.set_photo(photo(0));
        assert!(NewProduct::from_fields(fields).unwrap().photo.is_none());
    }

    #[test]
    fn test_malformed_values() {
        for (field, value) in [
            ("price", "ten"),
            ("price", "-1"),
            ("quantity", "1.5"),
            ("quantity", "-3"),
            ("category", "abc"),
            ("shipping", "maybe"),
        ] {
            let mut fields = mask_fields();
            fields.insert(field, value);
            let err = NewProduct::from_fields(fields).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidField { field: f, .. } if f == field),
                "{field}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_name_length_limit() {
        let mut fields = mask_fields();
        fields.insert("name", "x".repeat(MAX_NAME_LENGTH));
        assert!(NewProduct::from_fields(fields).is_ok());

        let mut fields = mask_fields();
        fields.insert("name", "x".repeat(MAX_NAME_LENGTH + 1));
        assert!(NewProduct::from_fields(fields).is_err());
    }

    #[test]
    fn test_price_rounding_and_ceiling() {
        assert_eq!(parse_price("12.346").unwrap(), Decimal::new(1235, 2));
        assert!(parse_price("9999999999.99").is_ok());
        assert!(parse_price("10000000000").is_err());
    }

    #[test]
    fn test_shipping_spellings() {
        assert!(parse_shipping("TRUE").unwrap());
        assert!(parse_shipping("1").unwrap());
        assert!(!parse_shipping("false").unwrap());
        assert!(!parse_shipping("0").unwrap());
    }

    #[test]
    fn test_patch_keeps_unsubmitted_fields() {
        let mut fields = ProductFields::default();
        fields.insert("price", "7.25");
        let merged = ProductPatch::from_fields(fields)
            .unwrap()
            .merge(&stored_product());

        assert_eq!(merged.price, Decimal::new(725, 2));
        assert_eq!(merged.name, "Gloves");
        assert_eq!(merged.description, "Nitrile");
        assert_eq!(merged.category, CategoryId::new(2));
        assert_eq!(merged.quantity, 40);
        assert!(!merged.shipping);
        assert!(merged.photo.is_none());
    }

    #[test]
    fn test_patch_rejects_blank_submitted_field() {
        let mut fields = ProductFields::default();
        fields.insert("name", "");
        assert!(matches!(
            ProductPatch::from_fields(fields),
            Err(ValidationError::InvalidField { field: "name", .. })
        ));
    }

    #[test]
    fn test_patch_checks_photo_size() {
        let mut fields = ProductFields::default();
        fields.set_photo(photo(MAX_PHOTO_BYTES + 1));
        assert_eq!(
            ProductPatch::from_fields(fields),
            Err(ValidationError::PhotoTooLarge)
        );
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "All fields are required"
        );
        assert_eq!(
            ValidationError::PhotoTooLarge.to_string(),
            "Image should be less than 1mb in size"
        );
    }
}
