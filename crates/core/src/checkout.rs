//! Turning cart lines into order lines.
//!
//! The storefront reads the cart under a row lock, hands the lines here, and
//! persists whatever comes back.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::{ProductId, Quantity, UnitPrice};

/// Reasons a cart cannot be checked out.
///
/// Both are reported to the client as a validation error on `cart_id`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutRejection {
    #[error("No cart with the given id found.")]
    CartNotFound,
    #[error("The cart is empty.")]
    CartEmpty,
}

/// An order line with its price frozen at checkout.
///
/// `unit_price` is copied from the product at the instant of checkout and is
/// never recalculated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: UnitPrice,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Snapshot every cart line into an order line, preserving order.
///
/// # Errors
///
/// Returns [`CheckoutRejection::CartEmpty`] if there are no lines.
pub fn freeze_lines(lines: &[CartLine]) -> Result<Vec<OrderLine>, CheckoutRejection> {
    if lines.is_empty() {
        return Err(CheckoutRejection::CartEmpty);
    }
    Ok(lines.iter().map(OrderLine::from).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(product: i32, quantity: i64, cents: i64) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            quantity: Quantity::new(quantity).unwrap(),
            unit_price: UnitPrice::new(Decimal::new(cents, 2)).unwrap(),
        }
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        assert_eq!(freeze_lines(&[]), Err(CheckoutRejection::CartEmpty));
    }

    #[test]
    fn test_lines_match_cardinality_and_quantities() {
        let cart = [line(1, 2, 1000), line(2, 1, 500)];
        let order = freeze_lines(&cart).unwrap();

        assert_eq!(order.len(), 2);
        for (c, o) in cart.iter().zip(&order) {
            assert_eq!(c.product_id, o.product_id);
            assert_eq!(c.quantity, o.quantity);
            assert_eq!(c.unit_price, o.unit_price);
        }
    }

    #[test]
    fn test_frozen_price_ignores_later_changes() {
        let mut cart = [line(1, 1, 1000)];
        let order = freeze_lines(&cart).unwrap();
        cart[0].unit_price = UnitPrice::new(Decimal::new(9900, 2)).unwrap();
        assert_eq!(order[0].unit_price.amount(), Decimal::new(1000, 2));
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            CheckoutRejection::CartNotFound.to_string(),
            "No cart with the given id found."
        );
        assert_eq!(CheckoutRejection::CartEmpty.to_string(), "The cart is empty.");
    }
}
