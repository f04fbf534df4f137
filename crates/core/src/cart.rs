//! Cart line math.
//!
//! Totals are derived from the product's *current* price every time they are
//! read. Nothing here is persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Quantity, UnitPrice};

/// One product on a cart, joined with that product's live price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: UnitPrice,
}

impl CartLine {
    /// `quantity × unit_price`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price.line_total(self.quantity)
    }
}

/// Sum of line totals; zero for an empty cart.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: i32, quantity: i64, price: &str) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            quantity: Quantity::new(quantity).unwrap(),
            unit_price: UnitPrice::new(price.parse().unwrap()).unwrap(),
        }
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_cart_total() {
        let lines = [line(1, 2, "10.00"), line(2, 1, "5.00")];
        assert_eq!(lines[0].total(), Decimal::new(2000, 2));
        assert_eq!(cart_total(&lines), Decimal::new(2500, 2));
    }

    #[test]
    fn test_total_follows_live_price() {
        let mut l = line(1, 3, "4.00");
        assert_eq!(cart_total(&[l]), Decimal::new(1200, 2));
        l.unit_price = UnitPrice::new(Decimal::new(500, 2)).unwrap();
        assert_eq!(cart_total(&[l]), Decimal::new(1500, 2));
    }
}
