//! Listing, filtering and search parameters.
//!
//! Sort keys and filter keys are matched against a whitelist and mapped to
//! fixed column expressions; only values are ever bound into SQL.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use corona_core::CategoryId;

use super::ValidationError;

/// Largest page a listing may request.
pub const MAX_LIMIT: i64 = 1000;

/// Default page size for the home-page listings.
pub const DEFAULT_LIST_LIMIT: i64 = 6;

/// Default page size for the shop filter listing.
pub const DEFAULT_SEARCH_LIMIT: i64 = 100;

/// Product column a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Price,
    Quantity,
    Sold,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Column expression used in `ORDER BY`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "p.id",
            Self::Name => "p.name",
            Self::Price => "p.price",
            Self::Quantity => "p.quantity",
            Self::Sold => "p.sold",
            Self::CreatedAt => "p.created_at",
            Self::UpdatedAt => "p.updated_at",
        }
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" | "_id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "quantity" => Ok(Self::Quantity),
            "sold" => Ok(Self::Sold),
            "created_at" | "createdAt" => Ok(Self::CreatedAt),
            "updated_at" | "updatedAt" => Ok(Self::UpdatedAt),
            other => Err(ValidationError::UnknownSortField(other.to_owned())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(Self::Asc),
            "desc" | "descending" | "-1" => Ok(Self::Desc),
            _ => Err(ValidationError::UnknownSortOrder(s.to_owned())),
        }
    }
}

/// Query string of `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
}

/// Validated parameters of a sorted, truncated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            sort: SortField::Id,
            order: SortOrder::Asc,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListParams {
    /// Apply defaults (`id`, ascending, 6) to whatever the client omitted.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for unknown sort keys, orders or
    /// out-of-range limits.
    pub fn from_query(query: &ListQuery) -> Result<Self, ValidationError> {
        let defaults = Self::default();
        Ok(Self {
            sort: non_blank(query.sort_by.as_deref())
                .map_or(Ok(defaults.sort), str::parse)?,
            order: non_blank(query.order.as_deref())
                .map_or(Ok(defaults.order), str::parse)?,
            limit: non_blank(query.limit.as_deref())
                .map_or(Ok(defaults.limit), parse_limit)?,
        })
    }
}

/// Query string of `GET /api/products/related/{id}`. Related products are
/// always ordered by id, so only the limit is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<String>,
}

impl RelatedQuery {
    /// The requested limit, defaulting to 6.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] for an out-of-range limit.
    pub fn limit(&self) -> Result<i64, ValidationError> {
        non_blank(self.limit.as_deref()).map_or(Ok(DEFAULT_LIST_LIMIT), parse_limit)
    }
}

/// Body of `POST /api/products/by/search`.
///
/// `filters` maps a product field to the accepted values; `price` holds a
/// `[min, max]` pair. Empty arrays are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: BTreeMap<String, Vec<Value>>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<Value>,
    pub skip: Option<Value>,
}

/// Validated parameters of a filtered, paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub filters: Vec<CatalogFilter>,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub skip: i64,
}

impl SearchRequest {
    /// Validate the request, applying defaults (`id`, descending, 100, skip 0).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for unknown filter or sort keys and for
    /// malformed filter values.
    pub fn into_params(self) -> Result<SearchParams, ValidationError> {
        let mut filters = Vec::with_capacity(self.filters.len());
        for (key, values) in &self.filters {
            if let Some(filter) = CatalogFilter::parse(key, values)? {
                filters.push(filter);
            }
        }

        let limit = match &self.limit {
            Some(value) if !value.is_null() => parse_limit(&json_to_string(value))?,
            _ => DEFAULT_SEARCH_LIMIT,
        };
        let skip = match &self.skip {
            Some(value) if !value.is_null() => parse_skip(&json_to_string(value))?,
            _ => 0,
        };

        Ok(SearchParams {
            filters,
            sort: non_blank(self.sort_by.as_deref()).map_or(Ok(SortField::Id), str::parse)?,
            order: non_blank(self.order.as_deref()).map_or(Ok(SortOrder::Desc), str::parse)?,
            limit,
            skip,
        })
    }
}

/// One predicate of the shop filter listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogFilter {
    /// `min <= price <= max`.
    PriceRange { min: Decimal, max: Decimal },
    Category(Vec<CategoryId>),
    Shipping(Vec<bool>),
    Name(Vec<String>),
    Quantity(Vec<i32>),
    Sold(Vec<i32>),
}

impl CatalogFilter {
    /// Parse one `filters` entry. Returns `None` for an empty value list.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for unknown keys or values that do not
    /// fit the field.
    pub fn parse(key: &str, values: &[Value]) -> Result<Option<Self>, ValidationError> {
        if values.is_empty() {
            return Ok(None);
        }

        let filter = match key {
            "price" => {
                let [min, max] = values else {
                    return Err(ValidationError::InvalidPriceRange);
                };
                let bound = |v: &Value| {
                    super::parse_price(&json_to_string(v))
                        .map_err(|_| ValidationError::InvalidPriceRange)
                };
                Self::PriceRange {
                    min: bound(min)?,
                    max: bound(max)?,
                }
            }
            "category" => Self::Category(parse_values(key, values, |s| s.parse().ok())?),
            "shipping" => Self::Shipping(parse_values(key, values, |s| {
                super::parse_shipping(s).ok()
            })?),
            "name" => Self::Name(parse_values(key, values, |s| Some(s.to_owned()))?),
            "quantity" => Self::Quantity(parse_values(key, values, |s| s.parse().ok())?),
            "sold" => Self::Sold(parse_values(key, values, |s| s.parse().ok())?),
            other => return Err(ValidationError::UnknownFilter(other.to_owned())),
        };
        Ok(Some(filter))
    }
}

/// Append a `WHERE` clause for `filters` to `qb`. Appends nothing when
/// `filters` is empty.
pub fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[CatalogFilter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            CatalogFilter::PriceRange { min, max } => {
                qb.push("p.price BETWEEN ")
                    .push_bind(*min)
                    .push(" AND ")
                    .push_bind(*max);
            }
            CatalogFilter::Category(ids) => {
                let ids: Vec<i32> = ids.iter().map(CategoryId::as_i32).collect();
                qb.push("p.category_id = ANY(").push_bind(ids).push(")");
            }
            CatalogFilter::Shipping(values) => {
                qb.push("p.shipping = ANY(").push_bind(values.clone()).push(")");
            }
            CatalogFilter::Name(values) => {
                qb.push("p.name = ANY(").push_bind(values.clone()).push(")");
            }
            CatalogFilter::Quantity(values) => {
                qb.push("p.quantity = ANY(").push_bind(values.clone()).push(")");
            }
            CatalogFilter::Sold(values) => {
                qb.push("p.sold = ANY(").push_bind(values.clone()).push(")");
            }
        }
    }
}

/// Query string of `GET /api/products/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextSearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// A validated free-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    pub text: String,
    pub category: Option<CategoryId>,
}

impl TextSearchQuery {
    /// Validate the query. Returns `None` when there is no search text;
    /// a category of `All` (or none) searches every category.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] for a malformed category id.
    pub fn into_search(self) -> Result<Option<TextSearch>, ValidationError> {
        let Some(text) = non_blank(self.search.as_deref()) else {
            return Ok(None);
        };

        let category = match non_blank(self.category.as_deref()) {
            None | Some("All") => None,
            Some(id) => Some(id.parse().map_err(|_| ValidationError::InvalidField {
                field: "category",
                reason: "must be a category id".to_owned(),
            })?),
        };

        Ok(Some(TextSearch {
            text: text.to_owned(),
            category,
        }))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Render a JSON scalar the way a form would submit it.
fn json_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_owned(),
        other => other.to_string(),
    }
}

fn parse_values<T>(
    key: &str,
    values: &[Value],
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ValidationError> {
    values
        .iter()
        .map(|v| {
            parse(&json_to_string(v))
                .ok_or_else(|| ValidationError::InvalidFilterValue(key.to_owned()))
        })
        .collect()
}

fn parse_limit(value: &str) -> Result<i64, ValidationError> {
    match value.parse::<i64>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(ValidationError::InvalidField {
            field: "limit",
            reason: format!("must be between 1 and {MAX_LIMIT}"),
        }),
    }
}

fn parse_skip(value: &str) -> Result<i64, ValidationError> {
    match value.parse::<i64>() {
        Ok(skip) if skip >= 0 => Ok(skip),
        _ => Err(ValidationError::InvalidField {
            field: "skip",
            reason: "must be a non-negative whole number".to_owned(),
        }),
    }
}
