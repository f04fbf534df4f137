//! Checkout: turn a cart into an order.
//!
//! Everything from locking the cart to deleting it happens in one
//! transaction. The cart row is locked first, so a second checkout of the
//! same cart waits for the first and then finds the cart gone. Prices are
//! read inside the transaction and copied onto the order items.
//!
//! The order-created event is published only after commit.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use aladabuy_core::{CartId, CheckoutRejection, UserId, freeze_lines};

use crate::db::{RepositoryError, carts, customers, orders};
use crate::error::add_breadcrumb;
use crate::models::Order;
use crate::services::events::{EventBus, OrderCreated};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart is missing or empty.
    #[error(transparent)]
    Rejected(#[from] CheckoutRejection),

    /// The user has no customer profile.
    #[error("no customer profile for this user")]
    CustomerNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Places orders and announces them.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    events: &'a EventBus,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, events: &'a EventBus) -> Self {
        Self { pool, events }
    }

    /// Convert `cart` into a pending order owned by `user`'s customer.
    ///
    /// On any error the transaction is rolled back and the cart is left
    /// untouched. Listener failures after commit are logged only.
    ///
    /// # Errors
    ///
    /// - `Rejected(CartNotFound)` if the cart does not exist
    /// - `Rejected(CartEmpty)` if it has no items
    /// - `CustomerNotFound` if `user` has no customer profile
    /// - `Repository` if the database fails
    #[instrument(skip(self), fields(cart_id = %cart, user_id = %user))]
    pub async fn place_order(&self, cart: CartId, user: UserId) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        if !carts::lock_in(&mut *tx, cart).await? {
            return Err(CheckoutRejection::CartNotFound.into());
        }
        let lines = freeze_lines(&carts::lines_in(&mut *tx, cart).await?)?;
        let customer = customers::id_for_user_in(&mut *tx, user)
            .await?
            .ok_or(CheckoutError::CustomerNotFound)?;

        let order = orders::insert_in(&mut *tx, customer).await?;
        let written = orders::insert_items_in(&mut *tx, order.id, &lines).await?;
        if written != lines.len() as u64 {
            return Err(RepositoryError::DataCorruption(format!(
                "order {} expected {} items, wrote {written}",
                order.id,
                lines.len()
            ))
            .into());
        }
        if !carts::delete_in(&mut *tx, cart).await? {
            return Err(RepositoryError::DataCorruption(format!(
                "locked cart {cart} vanished before delete"
            ))
            .into());
        }

        tx.commit().await?;

        info!(order_id = %order.id, customer_id = %customer, items = lines.len(), "Order placed");
        let order_id = order.id.to_string();
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

        let summary = self.events.send_robust(&OrderCreated::new(&order, lines.len()));
        if summary.failed > 0 {
            tracing::warn!(
                order_id = %order.id,
                failed = summary.failed,
                delivered = summary.delivered,
                "Some order listeners failed"
            );
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages_pass_through() {
        let err: CheckoutError = CheckoutRejection::CartNotFound.into();
        assert_eq!(err.to_string(), "No cart with the given id found.");

        let err: CheckoutError = CheckoutRejection::CartEmpty.into();
        assert_eq!(err.to_string(), "The cart is empty.");
    }

    #[test]
    fn test_sqlx_errors_become_repository_errors() {
        let err: CheckoutError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(
            err,
            CheckoutError::Repository(RepositoryError::Database(_))
        ));
    }
}
