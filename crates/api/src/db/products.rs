//! Product repository for database operations.
//!
//! Every read joins the owning category so responses carry it populated.
//! Photo bytes are only ever selected by [`ProductRepository::get_photo`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use corona_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::catalog::{ListParams, NewProduct, SearchParams, TextSearch, push_filters};
use crate::models::{CategorySummary, Photo, Product};

/// Column list shared by every product read. Expects the product aliased
/// `p` and its category `c`.
macro_rules! product_columns {
    () => {
        "p.id, p.name, p.description, p.price, p.category_id, c.name AS category_name, \
         p.quantity, p.sold, p.shipping, (p.photo_data IS NOT NULL) AS has_photo, \
         p.created_at, p.updated_at"
    };
}

const SELECT_PRODUCTS: &str = concat!(
    "SELECT ",
    product_columns!(),
    " FROM shop.product p JOIN shop.category c ON c.id = p.category_id"
);

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    category_id: CategoryId,
    category_name: String,
    quantity: i32,
    sold: i32,
    shipping: bool,
    has_photo: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: CategorySummary {
                id: row.category_id,
                name: row.category_name,
            },
            quantity: row.quantity,
            sold: row.sold,
            shipping: row.shipping,
            has_photo: row.has_photo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A quantity adjustment for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: ProductId,
    /// Units bought. Must be positive.
    pub count: i32,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product and return it with its category populated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, including
    /// foreign-key violations for an unknown category.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let (photo_data, photo_type) = photo_parts(product.photo.as_ref());

        let row = sqlx::query_as::<_, ProductRow>(concat!(
            "WITH p AS (
                INSERT INTO shop.product
                    (name, description, price, category_id, quantity, shipping,
                     photo_data, photo_content_type)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT ",
            product_columns!(),
            " FROM p JOIN shop.category c ON c.id = p.category_id"
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category)
        .bind(product.quantity)
        .bind(product.shipping)
        .bind(photo_data)
        .bind(photo_type)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM shop.product p JOIN shop.category c ON c.id = p.category_id
              WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product's photo.
    ///
    /// Returns `Ok(None)` when the product exists but has no photo.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_photo(&self, id: ProductId) -> Result<Option<Photo>, RepositoryError> {
        let row: Option<(Option<Vec<u8>>, Option<String>)> = sqlx::query_as(
            "SELECT photo_data, photo_content_type FROM shop.product WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let (data, content_type) = row.ok_or(RepositoryError::NotFound)?;
        Ok(data.map(|data| Photo {
            data,
            content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_owned()),
        }))
    }

    /// Overwrite a product's fields. A `None` photo keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, product))]
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let (photo_data, photo_type) = photo_parts(product.photo.as_ref());

        let row = sqlx::query_as::<_, ProductRow>(concat!(
            "WITH p AS (
                UPDATE shop.product
                SET name = $2,
                    description = $3,
                    price = $4,
                    category_id = $5,
                    quantity = $6,
                    shipping = $7,
                    photo_data = COALESCE($8, photo_data),
                    photo_content_type = COALESCE($9, photo_content_type),
                    updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            SELECT ",
            product_columns!(),
            " FROM p JOIN shop.category c ON c.id = p.category_id"
        ))
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category)
        .bind(product.quantity)
        .bind(product.shipping)
        .bind(photo_data)
        .bind(photo_type)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List products sorted by one field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_PRODUCTS);
        push_order(&mut qb, params.sort.column(), params.order.sql());
        qb.push(" LIMIT ").push_bind(params.limit);

        let rows = qb.build_query_as::<ProductRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List other products in the same category as `product`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn list_related(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM shop.product p JOIN shop.category c ON c.id = p.category_id
              WHERE p.category_id = $1 AND p.id <> $2
              ORDER BY p.id
              LIMIT $3"
        ))
        .bind(product.category.id)
        .bind(product.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List products matching the shop filters, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, params), fields(filters = params.filters.len(), skip = params.skip))]
    pub async fn list_by_search(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_PRODUCTS);
        push_filters(&mut qb, &params.filters);
        push_order(&mut qb, params.sort.column(), params.order.sql());
        qb.push(" LIMIT ").push_bind(params.limit);
        qb.push(" OFFSET ").push_bind(params.skip);

        let rows = qb.build_query_as::<ProductRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Case-insensitive substring search on product names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, search: &TextSearch) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM shop.product p JOIN shop.category c ON c.id = p.category_id
              WHERE strpos(lower(p.name), lower($1)) > 0
                AND ($2::integer IS NULL OR p.category_id = $2)
              ORDER BY p.id"
        ))
        .bind(&search.text)
        .bind(search.category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// IDs of the categories at least one product belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn distinct_categories(&self) -> Result<Vec<CategoryId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, CategoryId>(
            "SELECT DISTINCT category_id FROM shop.product ORDER BY category_id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}

/// Decrease stock and increase units sold for every line, as one statement.
///
/// Lines for the same product are summed first. Run this inside a
/// transaction: when any product is missing or would drop below zero the
/// other rows are still updated, and the error tells the caller to roll back.
///
/// # Errors
///
/// Returns `RepositoryError::StockUnavailable` if any line cannot be applied.
/// Returns `RepositoryError::Database` if the update fails.
#[instrument(skip(conn, lines), fields(lines = lines.len()))]
pub async fn decrease_quantity(
    conn: &mut PgConnection,
    lines: &[StockLine],
) -> Result<(), RepositoryError> {
    let products: BTreeSet<ProductId> = lines.iter().map(|l| l.product_id).collect();
    if products.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = lines.iter().map(|l| l.product_id.as_i32()).collect();
    let counts: Vec<i32> = lines.iter().map(|l| l.count).collect();

    // A row only qualifies when the whole decrement fits, so a short count
    // of affected rows means at least one line was refused.
    let result = sqlx::query(
        "UPDATE shop.product p
         SET quantity = p.quantity - l.count,
             sold = p.sold + l.count,
             updated_at = now()
         FROM (
             SELECT product_id, SUM(count)::integer AS count
             FROM UNNEST($1::integer[], $2::integer[]) AS u(product_id, count)
             GROUP BY product_id
         ) l
         WHERE p.id = l.product_id
           AND l.count > 0
           AND p.quantity >= l.count",
    )
    .bind(ids)
    .bind(counts)
    .execute(&mut *conn)
    .await?;

    let applied = usize::try_from(result.rows_affected()).unwrap_or(usize::MAX);
    if applied != products.len() {
        tracing::warn!(
            requested = products.len(),
            applied,
            "Quantity decrease refused"
        );
        return Err(RepositoryError::StockUnavailable {
            requested: products.len(),
            failed: products.len().saturating_sub(applied),
        });
    }

    Ok(())
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, column: &str, direction: &str) {
    qb.push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(direction)
        .push(", p.id ")
        .push(direction);
}

fn photo_parts(photo: Option<&Photo>) -> (Option<&[u8]>, Option<&str>) {
    photo.map_or((None, None), |p| {
        (Some(p.data.as_slice()), Some(p.content_type.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_products_joins_category() {
        assert!(SELECT_PRODUCTS.starts_with("SELECT p.id, p.name"));
        assert!(SELECT_PRODUCTS.contains("c.name AS category_name"));
        assert!(SELECT_PRODUCTS.ends_with("JOIN shop.category c ON c.id = p.category_id"));
        assert!(!SELECT_PRODUCTS.contains("p.photo_data,"));
    }

    #[test]
    fn test_push_order_adds_id_tiebreak() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.id FROM shop.product p");
        push_order(&mut qb, "p.sold", "DESC");
        assert_eq!(
            qb.sql(),
            "SELECT p.id FROM shop.product p ORDER BY p.sold DESC, p.id DESC"
        );
    }

    #[test]
    fn test_photo_parts() {
        assert_eq!(photo_parts(None), (None, None));
        let photo = Photo {
            data: vec![1, 2, 3],
            content_type: "image/jpeg".to_owned(),
        };
        assert_eq!(
            photo_parts(Some(&photo)),
            (Some([1_u8, 2, 3].as_slice()), Some("image/jpeg"))
        );
    }
}
