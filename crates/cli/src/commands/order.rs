//! Order maintenance.

use aladabuy_core::{OrderId, PaymentStatus};
use aladabuy_storefront::db::{OrderRepository, RepositoryError};

use super::{CommandError, connect};

/// Set an order's payment status.
///
/// `status` accepts a code (`P`, `C`, `F`) or a name, case-insensitively.
///
/// # Errors
///
/// Returns an error if the status is unknown, the order does not exist, or
/// the database is unreachable.
pub async fn set_status(order_id: i32, status: &str) -> Result<(), CommandError> {
    let status = status
        .parse::<PaymentStatus>()
        .map_err(|e| CommandError::Invalid(e.to_string()))?;
    let id = OrderId::new(order_id);
    let pool = connect().await?;

    let order = OrderRepository::new(&pool)
        .set_payment_status(id, status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CommandError::Invalid(format!("order {id} does not exist")),
            other => other.into(),
        })?;

    tracing::info!(order_id = %order.id, payment_status = %order.payment_status, "Payment status updated");
    Ok(())
}
