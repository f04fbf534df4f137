//! Order rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aladabuy_core::{CustomerId, OrderId, OrderItemId, PaymentStatus, ProductId, Quantity, UnitPrice};

/// A placed order. Only `payment_status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    #[serde(rename = "customer")]
    pub customer_id: CustomerId,
}

/// An order item with its frozen price and the product's current summary.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderItemDetail {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_title: String,
    /// The product's price today.
    pub product_unit_price: UnitPrice,
    /// The price paid, captured at checkout.
    pub unit_price: UnitPrice,
    pub quantity: Quantity,
}
