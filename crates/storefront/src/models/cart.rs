//! Cart rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aladabuy_core::{CartId, CartItemId, CartLine, ProductId, Quantity, UnitPrice};

/// An anonymous shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub created_at: DateTime<Utc>,
}

/// A bare cart item row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A cart item joined with its product's live title and price.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CartItemDetail {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: UnitPrice,
    pub quantity: Quantity,
}

impl CartItemDetail {
    /// The pricing view of this item.
    #[must_use]
    pub const fn line(&self) -> CartLine {
        CartLine {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}
