//! Cart handlers. Carts are anonymous; the cart ID is the only credential.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{CartId, CartItemId, ProductId, Quantity, UnitPrice, cart_total};

use crate::db::{CartRepository, RepositoryError, carts::is_missing_product};
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::models::CartItemDetail;
use crate::state::AppState;
use crate::validation::{self, convert};

/// Product fields embedded in a cart or order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub unit_price: UnitPrice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product: ProductSummary,
    pub quantity: Quantity,
    pub total_price: Decimal,
}

impl From<CartItemDetail> for CartItemView {
    fn from(item: CartItemDetail) -> Self {
        Self {
            id: item.id,
            total_price: item.unit_price.line_total(item.quantity),
            quantity: item.quantity,
            product: ProductSummary {
                id: item.product_id,
                title: item.title,
                unit_price: item.unit_price,
            },
        }
    }
}

/// A cart with its items priced at current product prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
}

impl CartView {
    #[must_use]
    pub fn new(id: CartId, items: Vec<CartItemDetail>) -> Self {
        let lines: Vec<_> = items.iter().map(CartItemDetail::line).collect();
        Self {
            id,
            total_price: cart_total(&lines),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemBody {
    pub product_id: ProductId,
    #[validate(custom(function = "validation::quantity"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemBody {
    #[validate(custom(function = "validation::quantity"))]
    pub quantity: i64,
}

/// Parse a cart ID from the path. Malformed IDs name no cart.
fn cart_id(raw: &str) -> Result<CartId> {
    raw.parse().map_err(|_| AppError::not_found())
}

/// Map a failed item write to the field that caused it.
fn item_write_error(err: RepositoryError) -> AppError {
    if is_missing_product(&err) {
        return AppError::field("product_id", "No product with the given ID was found.");
    }
    match err {
        // Merged quantity no longer fits
        RepositoryError::Invalid(_) => AppError::field(
            "quantity",
            "Ensure this value is less than or equal to 32767.",
        ),
        other => other.into(),
    }
}

/// Create an empty cart.
#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<CartView>)> {
    let cart = CartRepository::new(state.pool()).create().await?;
    tracing::debug!(cart_id = %cart.id, "Cart created");
    Ok((StatusCode::CREATED, Json(CartView::new(cart.id, Vec::new()))))
}

/// Show a cart with live totals.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<CartView>> {
    let id = cart_id(&raw)?;
    let carts = CartRepository::new(state.pool());
    carts.get(id).await?.ok_or_else(AppError::not_found)?;
    Ok(Json(CartView::new(id, carts.items(id).await?)))
}

/// Delete a cart and its items.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(raw): Path<String>) -> Result<StatusCode> {
    CartRepository::new(state.pool())
        .delete(cart_id(&raw)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a cart's items.
#[instrument(skip(state))]
pub async fn items(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<CartItemView>>> {
    let id = cart_id(&raw)?;
    let carts = CartRepository::new(state.pool());
    carts.get(id).await?.ok_or_else(AppError::not_found)?;
    let items = carts.items(id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Add a product to a cart, merging with an existing line for it.
#[instrument(skip(state, body), fields(product_id = %body.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    ValidJson(body): ValidJson<AddItemBody>,
) -> Result<(StatusCode, Json<CartItemView>)> {
    let id = cart_id(&raw)?;
    let quantity = convert("quantity", Quantity::new(body.quantity))?;

    let carts = CartRepository::new(state.pool());
    let added = carts
        .add_item(id, body.product_id, quantity)
        .await
        .map_err(item_write_error)?;
    tracing::debug!(cart_id = %id, item_id = %added.id, quantity = %added.quantity, "Cart item saved");

    let item = carts
        .item(id, added.id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// Show one cart item.
#[instrument(skip(state))]
pub async fn item(
    State(state): State<AppState>,
    Path((raw, item_id)): Path<(String, CartItemId)>,
) -> Result<Json<CartItemView>> {
    let item = CartRepository::new(state.pool())
        .item(cart_id(&raw)?, item_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(item.into()))
}

/// Replace an item's quantity.
#[instrument(skip(state, body))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((raw, item_id)): Path<(String, CartItemId)>,
    ValidJson(body): ValidJson<UpdateItemBody>,
) -> Result<Json<CartItemView>> {
    let id = cart_id(&raw)?;
    let quantity = convert("quantity", Quantity::new(body.quantity))?;

    let carts = CartRepository::new(state.pool());
    carts.update_quantity(id, item_id, quantity).await?;
    let item = carts
        .item(id, item_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(item.into()))
}

/// Remove an item from a cart.
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((raw, item_id)): Path<(String, CartItemId)>,
) -> Result<StatusCode> {
    CartRepository::new(state.pool())
        .remove_item(cart_id(&raw)?, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn detail(id: i32, product: i32, cents: i64, quantity: i64) -> CartItemDetail {
        CartItemDetail {
            id: CartItemId::new(id),
            product_id: ProductId::new(product),
            title: format!("Product {product}"),
            unit_price: UnitPrice::new(Decimal::new(cents, 2)).unwrap(),
            quantity: Quantity::new(quantity).unwrap(),
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let id = CartId::generate();
        let view = CartView::new(id, vec![detail(1, 1, 1000, 2), detail(2, 2, 500, 1)]);
        assert_eq!(view.items[0].total_price, Decimal::new(2000, 2));
        assert_eq!(view.total_price, Decimal::new(2500, 2));
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::new(CartId::generate(), Vec::new());
        assert!(view.items.is_empty());
        assert_eq!(view.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_item_view_shape() {
        let json = serde_json::to_value(CartItemView::from(detail(3, 7, 1250, 4))).unwrap();
        assert_eq!(json["product"]["id"], 7);
        assert_eq!(json["product"]["unit_price"], "12.50");
        assert_eq!(json["quantity"], 4);
    }

    #[test]
    fn test_malformed_cart_id_is_not_found() {
        assert!(matches!(cart_id("not-a-uuid"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_missing_product_maps_to_field() {
        let err = item_write_error(RepositoryError::Invalid("cart_item_product_id_fkey".to_string()));
        let AppError::Validation(fields) = err else {
            unreachable!("expected a validation error");
        };
        assert!(fields.contains_key("product_id"));
    }

    #[test]
    fn test_quantity_validation() {
        let body = AddItemBody {
            product_id: ProductId::new(1),
            quantity: 0,
        };
        assert!(body.validate().unwrap_err().field_errors().contains_key("quantity"));
    }
}
