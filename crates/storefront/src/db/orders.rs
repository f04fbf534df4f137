//! Order repository.
//!
//! Orders are written only by the checkout transaction (see
//! [`crate::services::checkout`]); afterwards only `payment_status` changes.
//! Order items hold a `RESTRICT` reference to both their order and product,
//! so neither can be deleted while the history exists.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use aladabuy_core::{CustomerId, OrderId, OrderLine, PaymentStatus, ProductId, Quantity};

use super::RepositoryError;
use crate::models::{Order, OrderItemDetail};

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

    /// List orders, newest first; all of them, or one customer's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer: Option<CustomerId>) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, placed_at, payment_status, customer_id
            FROM store.order
            WHERE $1::int IS NULL OR customer_id = $1
            ORDER BY placed_at DESC, id DESC
            ",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, placed_at, payment_status, customer_id FROM store.order WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Items of the given orders with product summaries, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, orders: &[OrderId]) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItemDetail>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id,
                   p.title AS product_title, p.unit_price AS product_unit_price,
                   oi.unit_price, oi.quantity
            FROM store.order_item oi
            JOIN store.product p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        )
        .bind(orders)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Set an order's payment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(
            r"
            UPDATE store.order
            SET payment_status = $2
            WHERE id = $1
            RETURNING id, placed_at, payment_status, customer_id
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Protected` while it still has items.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(RepositoryError::on_delete)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Insert a pending order for a customer inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Invalid` if the customer does not exist.
pub async fn insert_in(
    conn: &mut PgConnection,
    customer: CustomerId,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(
        r"
        INSERT INTO store.order (customer_id, payment_status)
        VALUES ($1, $2)
        RETURNING id, placed_at, payment_status, customer_id
        ",
    )
    .bind(customer)
    .bind(PaymentStatus::default())
    .fetch_one(&mut *conn)
    .await
    .map_err(RepositoryError::on_write)
}

/// Insert all order lines in one statement. Returns the number of rows written.
///
/// # Errors
///
/// Returns `RepositoryError::Invalid` if a referenced product vanished.
pub async fn insert_items_in(
    conn: &mut PgConnection,
    order: OrderId,
    lines: &[OrderLine],
) -> Result<u64, RepositoryError> {
    let products: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
    let quantities: Vec<Quantity> = lines.iter().map(|l| l.quantity).collect();
    let prices: Vec<Decimal> = lines.iter().map(|l| l.unit_price.amount()).collect();

    let result = sqlx::query(
        r"
        INSERT INTO store.order_item (order_id, product_id, quantity, unit_price)
        SELECT $1, t.product_id, t.quantity, t.unit_price
        FROM UNNEST($2::int[], $3::smallint[], $4::numeric[])
            WITH ORDINALITY AS t (product_id, quantity, unit_price, ord)
        ORDER BY t.ord
        ",
    )
    .bind(order)
    .bind(&products)
    .bind(&quantities)
    .bind(&prices)
    .execute(&mut *conn)
    .await
    .map_err(RepositoryError::on_write)?;

    Ok(result.rows_affected())
}
