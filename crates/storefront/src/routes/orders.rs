//! Order handlers. Placing an order runs the checkout workflow.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{
    CartId, CheckoutRejection, CustomerId, OrderId, OrderItemId, PaymentStatus, Quantity,
    UnitPrice,
};

use super::carts::ProductSummary;
use crate::db::{CustomerRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::middleware::{CurrentUser, RequireStaff, RequireUser};
use crate::models::{Order, OrderItemDetail};
use crate::services::CheckoutService;
use crate::state::AppState;
use crate::validation::{self, convert};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    /// The product as it is now.
    pub product: ProductSummary,
    /// The price paid.
    pub unit_price: UnitPrice,
    pub quantity: Quantity,
}

impl From<OrderItemDetail> for OrderItemView {
    fn from(item: OrderItemDetail) -> Self {
        Self {
            id: item.id,
            product: ProductSummary {
                id: item.product_id,
                title: item.product_title,
                unit_price: item.product_unit_price,
            },
            unit_price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub customer: CustomerId,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItemDetail>) -> Self {
        Self {
            id: order.id,
            placed_at: order.placed_at,
            payment_status: order.payment_status,
            customer: order.customer_id,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutBody {
    pub cart_id: String,
}

impl CheckoutBody {
    /// A malformed ID cannot name a cart.
    fn cart_id(&self) -> Result<CartId> {
        self.cart_id
            .trim()
            .parse()
            .map_err(|_| AppError::field("cart_id", CheckoutRejection::CartNotFound.to_string()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderBody {
    #[validate(custom(function = "validation::payment_status"))]
    pub payment_status: String,
}

/// Attach items to orders with one query.
async fn with_items(state: &AppState, orders: Vec<Order>) -> Result<Vec<OrderView>> {
    let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
    let mut items: HashMap<OrderId, Vec<OrderItemDetail>> = HashMap::new();
    for item in OrderRepository::new(state.pool()).items(&ids).await? {
        items.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|o| {
            let own = items.remove(&o.id).unwrap_or_default();
            OrderView::new(o, own)
        })
        .collect())
}

/// The order, if `user` may see it. Others' orders are reported missing.
async fn visible_order(state: &AppState, user: &CurrentUser, id: OrderId) -> Result<Order> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(AppError::not_found)?;
    if user.is_staff {
        return Ok(order);
    }

    let owner = CustomerRepository::new(state.pool())
        .get_by_user(user.id)
        .await?
        .map(|c| c.id);
    if owner == Some(order.customer_id) {
        Ok(order)
    } else {
        Err(AppError::not_found())
    }
}

/// List orders: all for staff, otherwise the caller's own.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<OrderView>>> {
    let filter = if user.is_staff {
        None
    } else {
        match CustomerRepository::new(state.pool())
            .get_by_user(user.id)
            .await?
        {
            Some(customer) => Some(customer.id),
            None => return Ok(Json(Vec::new())),
        }
    };

    let orders = OrderRepository::new(state.pool()).list(filter).await?;
    Ok(Json(with_items(&state, orders).await?))
}

/// Check out a cart into a new order.
#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ValidJson(body): ValidJson<CheckoutBody>,
) -> Result<Json<OrderView>> {
    let cart_id = body.cart_id()?;
    let order = CheckoutService::new(state.pool(), state.events())
        .place_order(cart_id, user.id)
        .await?;

    let items = OrderRepository::new(state.pool())
        .items(&[order.id])
        .await?;
    Ok(Json(OrderView::new(order, items)))
}

/// Show one order.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = visible_order(&state, &user, order_id).await?;
    let items = OrderRepository::new(state.pool())
        .items(&[order.id])
        .await?;
    Ok(Json(OrderView::new(order, items)))
}

/// Set an order's payment status.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(order_id): Path<OrderId>,
    ValidJson(body): ValidJson<UpdateOrderBody>,
) -> Result<Json<OrderView>> {
    let status = convert("payment_status", body.payment_status.parse::<PaymentStatus>())?;
    let orders = OrderRepository::new(state.pool());
    let order = orders.set_payment_status(order_id, status).await?;
    tracing::info!(%order_id, payment_status = %status, "Payment status updated");

    let items = orders.items(&[order.id]).await?;
    Ok(Json(OrderView::new(order, items)))
}

/// Delete an order. Fails with 409 while it has items.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool()).delete(order_id).await?;
    tracing::info!(%order_id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aladabuy_core::ProductId;
    use rust_decimal::Decimal;

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(12),
            placed_at: DateTime::from_timestamp(1_770_000_000, 0).unwrap(),
            payment_status: PaymentStatus::Pending,
            customer_id: CustomerId::new(3),
        }
    }

    #[test]
    fn test_item_view_keeps_frozen_price() {
        let detail = OrderItemDetail {
            id: OrderItemId::new(1),
            order_id: OrderId::new(12),
            product_id: ProductId::new(5),
            product_title: "Baguette".to_string(),
            product_unit_price: UnitPrice::new(Decimal::new(1500, 2)).unwrap(),
            unit_price: UnitPrice::new(Decimal::new(1000, 2)).unwrap(),
            quantity: Quantity::new(2).unwrap(),
        };
        let view = OrderView::new(order(), vec![detail]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["items"][0]["unit_price"], "10.00");
        assert_eq!(json["items"][0]["product"]["unit_price"], "15.00");
        assert_eq!(json["payment_status"], "P");
        assert_eq!(json["customer"], 3);
    }

    #[test]
    fn test_malformed_cart_id_is_a_field_error() {
        let body = CheckoutBody {
            cart_id: "42".to_string(),
        };
        let AppError::Validation(fields) = body.cart_id().unwrap_err() else {
            unreachable!("expected a validation error");
        };
        assert_eq!(fields["cart_id"], vec!["No cart with the given id found.".to_string()]);
    }

    #[test]
    fn test_payment_status_validation() {
        let body = UpdateOrderBody {
            payment_status: "refunded".to_string(),
        };
        assert!(body.validate().is_err());
        let body = UpdateOrderBody {
            payment_status: "complete".to_string(),
        };
        assert!(body.validate().is_ok());
    }
}
