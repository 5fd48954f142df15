//! Order repository for database operations.
//!
//! Placing an order is the one multi-table write in the shop: stock,
//! the order itself and the buyer's history change together or not at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use corona_core::{OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use super::products::decrease_quantity;
use super::users::append_history;
use crate::checkout::NewOrder;
use crate::models::{HistoryEntry, Order, OrderLine};

const SELECT_ORDERS: &str = r#"
    SELECT o.id, o.user_id, u.name AS user_name, o.transaction_id, o.amount,
           o.address, o.status, o.created_at, o.updated_at,
           COALESCE(
               (SELECT json_agg(json_build_object(
                           'product_id', l.product_id,
                           'name', l.name,
                           'price', l.price::text,
                           'count', l.count
                       ) ORDER BY l.id)
                FROM shop.order_line l
                WHERE l.order_id = o.id),
               '[]'::json
           ) AS products
    FROM shop."order" o
    JOIN shop."user" u ON u.id = o.user_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    user_name: String,
    transaction_id: String,
    amount: Decimal,
    address: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    products: Json<Vec<OrderLine>>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            products: row.products.0,
            transaction_id: row.transaction_id,
            amount: row.amount,
            address: row.address,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InsertedOrder {
    id: OrderId,
    user_name: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct InsertedLine {
    product_id: Option<ProductId>,
    name: String,
    price: Decimal,
    count: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order in one transaction.
    ///
    /// Decreases stock for every line, records the order with each line's
    /// current name and price, and appends the lines to the buyer's history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StockUnavailable` if any product is missing
    /// or short of stock.
    /// Returns `RepositoryError::Database` for other database errors,
    /// including a unique violation for a reused transaction id.
    #[instrument(
        skip(self, order),
        fields(transaction_id = %order.transaction_id, lines = order.lines.len())
    )]
    pub async fn create(
        &self,
        user_id: UserId,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        decrease_quantity(&mut tx, &order.lines).await?;

        let inserted = sqlx::query_as::<_, InsertedOrder>(
            r#"
            INSERT INTO shop."order" (user_id, transaction_id, amount, address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, status, created_at, updated_at,
                      (SELECT name FROM shop."user" WHERE id = $1) AS user_name
            "#,
        )
        .bind(user_id)
        .bind(&order.transaction_id)
        .bind(order.amount)
        .bind(&order.address)
        .fetch_one(&mut *tx)
        .await?;

        let ids: Vec<i32> = order.lines.iter().map(|l| l.product_id.as_i32()).collect();
        let counts: Vec<i32> = order.lines.iter().map(|l| l.count).collect();

        let lines = sqlx::query_as::<_, InsertedLine>(
            r"
            INSERT INTO shop.order_line (order_id, product_id, name, price, count)
            SELECT $1, p.id, p.name, p.price, l.count
            FROM UNNEST($2::integer[], $3::integer[]) WITH ORDINALITY AS l(product_id, count, position)
            JOIN shop.product p ON p.id = l.product_id
            ORDER BY l.position
            RETURNING product_id, name, price, count
            ",
        )
        .bind(inserted.id)
        .bind(ids)
        .bind(counts)
        .fetch_all(&mut *tx)
        .await?;

        let history: Vec<HistoryEntry> = lines
            .iter()
            .map(|line| HistoryEntry {
                product_id: line.product_id,
                name: line.name.clone(),
                price: line.price,
                quantity: line.count,
                transaction_id: order.transaction_id.clone(),
                amount: order.amount,
                purchased_at: inserted.created_at,
            })
            .collect();
        append_history(&mut tx, user_id, &history).await?;

        tx.commit().await?;

        tracing::info!(order_id = %inserted.id, "Order placed");

        Ok(Order {
            id: inserted.id,
            user_id,
            user_name: inserted.user_name,
            products: lines
                .into_iter()
                .map(|line| OrderLine {
                    product_id: line.product_id,
                    name: line.name,
                    price: line.price,
                    count: line.count,
                })
                .collect(),
            transaction_id: order.transaction_id.clone(),
            amount: order.amount,
            address: order.address.clone(),
            status: inserted.status,
            created_at: inserted.created_at,
            updated_at: inserted.updated_at,
        })
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("{SELECT_ORDERS} WHERE o.id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!("{SELECT_ORDERS} ORDER BY o.created_at DESC, o.id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql =
            format!("{SELECT_ORDERS} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Set an order's fulfilment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE shop."order" SET status = $2, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
