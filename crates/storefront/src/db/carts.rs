//! Cart aggregate repository.
//!
//! A cart owns its items (`ON DELETE CASCADE`). Each `(cart, product)` pair
//! appears at most once; adding a product already in the cart merges the
//! quantities in a single `INSERT ... ON CONFLICT` statement, so concurrent
//! adds never lose an increment.
//!
//! The `*_in` functions run on a caller-supplied connection and are used by
//! the checkout transaction.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use aladabuy_core::{CartId, CartItemId, CartLine, ProductId, Quantity, UnitPrice, cart_total};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartItemDetail};

const CART_FK: &str = "cart_item_cart_id_fkey";
const PRODUCT_FK: &str = "cart_item_product_id_fkey";

#[derive(sqlx::FromRow)]
struct LineRow {
    product_id: ProductId,
    quantity: Quantity,
    unit_price: UnitPrice,
}

impl From<LineRow> for CartLine {
    fn from(row: LineRow) -> Self {
        Self {
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

/// Map a write failure on `store.cart_item`, turning a missing cart into
/// `NotFound`.
fn item_write_error(e: sqlx::Error) -> RepositoryError {
    match RepositoryError::on_write(e) {
        RepositoryError::Invalid(constraint) if constraint == CART_FK => RepositoryError::NotFound,
        other => other,
    }
}

/// Whether a write failed because the referenced product does not exist.
#[must_use]
pub fn is_missing_product(err: &RepositoryError) -> bool {
    matches!(err, RepositoryError::Invalid(constraint) if constraint == PRODUCT_FK)
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an empty cart with a fresh random ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self) -> Result<Cart, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(
            "INSERT INTO store.cart (id) VALUES ($1) RETURNING id, created_at",
        )
        .bind(CartId::generate())
        .fetch_one(self.pool)
        .await?;

        Ok(cart)
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let cart =
            sqlx::query_as::<_, Cart>("SELECT id, created_at FROM store.cart WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(cart)
    }

    /// Items of a cart with their products' live title and price, in the
    /// order they were first added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: CartId) -> Result<Vec<CartItemDetail>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItemDetail>(
            r"
            SELECT ci.id, ci.product_id, p.title, p.unit_price, ci.quantity
            FROM store.cart_item ci
            JOIN store.product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// One item of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item(
        &self,
        cart: CartId,
        item: CartItemId,
    ) -> Result<Option<CartItemDetail>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItemDetail>(
            r"
            SELECT ci.id, ci.product_id, p.title, p.unit_price, ci.quantity
            FROM store.cart_item ci
            JOIN store.product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1 AND ci.id = $2
            ",
        )
        .bind(cart)
        .bind(item)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// Sum of `quantity × unit_price` over the cart's items at current prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total(&self, id: CartId) -> Result<Decimal, RepositoryError> {
        let lines: Vec<CartLine> = self
            .items(id)
            .await?
            .iter()
            .map(CartItemDetail::line)
            .collect();
        Ok(cart_total(&lines))
    }

    /// Add `quantity` of a product to a cart, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist.
    /// Returns `RepositoryError::Invalid` if the product does not exist (see
    /// [`is_missing_product`]) or the merged quantity overflows.
    pub async fn add_item(
        &self,
        cart: CartId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        sqlx::query_as::<_, CartItem>(
            r"
            INSERT INTO store.cart_item (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT cart_item_cart_product_key
            DO UPDATE SET quantity = store.cart_item.quantity + EXCLUDED.quantity
            RETURNING id, cart_id, product_id, quantity
            ",
        )
        .bind(cart)
        .bind(product)
        .bind(quantity)
        .fetch_one(self.pool)
        .await
        .map_err(item_write_error)
    }

    /// Replace an item's quantity. Does not merge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not in the cart.
    pub async fn update_quantity(
        &self,
        cart: CartId,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        sqlx::query_as::<_, CartItem>(
            r"
            UPDATE store.cart_item
            SET quantity = $3
            WHERE cart_id = $1 AND id = $2
            RETURNING id, cart_id, product_id, quantity
            ",
        )
        .bind(cart)
        .bind(item)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await
        .map_err(item_write_error)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Remove one item from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not in the cart.
    pub async fn remove_item(&self, cart: CartId, item: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.cart_item WHERE cart_id = $1 AND id = $2")
            .bind(cart)
            .bind(item)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a cart and, by cascade, its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist.
    pub async fn delete(&self, id: CartId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        if delete_in(&mut conn, id).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

/// Lock a cart row for the rest of the transaction.
///
/// Returns `false` if the cart does not exist, including when a concurrent
/// transaction deleted it while this one waited for the lock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_in(conn: &mut PgConnection, id: CartId) -> Result<bool, RepositoryError> {
    let locked = sqlx::query_scalar::<_, CartId>(
        "SELECT id FROM store.cart WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(locked.is_some())
}

/// The cart's lines joined with each product's price at this instant.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines_in(conn: &mut PgConnection, id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, LineRow>(
        r"
        SELECT ci.product_id, ci.quantity, p.unit_price
        FROM store.cart_item ci
        JOIN store.product p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

/// Delete a cart. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_in(conn: &mut PgConnection, id: CartId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM store.cart WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cart_is_not_a_missing_product() {
        assert!(!is_missing_product(&RepositoryError::Invalid(
            CART_FK.to_string()
        )));
    }

    #[test]
    fn test_is_missing_product() {
        assert!(is_missing_product(&RepositoryError::Invalid(
            PRODUCT_FK.to_string()
        )));
        assert!(!is_missing_product(&RepositoryError::Invalid(
            "cart_item_quantity_check".to_string()
        )));
        assert!(!is_missing_product(&RepositoryError::NotFound));
    }
}
