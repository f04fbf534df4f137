//! Promotion route handlers, including attaching promotions to products.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{ProductId, PromotionId};

use crate::db::{ProductRepository, PromotionRepository};
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::middleware::RequireStaff;
use crate::models::Promotion;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct PromotionBody {
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub description: String,
    #[validate(range(min = 0.0, message = "Ensure this value is greater than or equal to 0."))]
    pub discount: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachBody {
    pub promotion: PromotionId,
}

/// List promotions.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Promotion>>> {
    Ok(Json(PromotionRepository::new(state.pool()).list().await?))
}

/// Create a promotion.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidJson(body): ValidJson<PromotionBody>,
) -> Result<(StatusCode, Json<Promotion>)> {
    let promotion = PromotionRepository::new(state.pool())
        .create(body.description.trim(), body.discount)
        .await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

/// Promotions attached to a product.
#[instrument(skip(state))]
pub async fn for_product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Promotion>>> {
    if !ProductRepository::new(state.pool()).exists(product_id).await? {
        return Err(AppError::not_found());
    }
    Ok(Json(
        PromotionRepository::new(state.pool())
            .for_product(product_id)
            .await?,
    ))
}

/// Attach a promotion to a product.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn attach(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(product_id): Path<ProductId>,
    ValidJson(body): ValidJson<AttachBody>,
) -> Result<(StatusCode, Json<Vec<Promotion>>)> {
    if !ProductRepository::new(state.pool()).exists(product_id).await? {
        return Err(AppError::not_found());
    }

    let promotions = PromotionRepository::new(state.pool());
    if promotions.get(body.promotion).await?.is_none() {
        return Err(AppError::field(
            "promotion",
            format!("Invalid pk \"{}\" - object does not exist.", body.promotion),
        ));
    }
    promotions.attach(product_id, body.promotion).await?;

    Ok((
        StatusCode::CREATED,
        Json(promotions.for_product(product_id).await?),
    ))
}

/// Detach a promotion from a product.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn detach(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path((product_id, promotion_id)): Path<(ProductId, PromotionId)>,
) -> Result<StatusCode> {
    PromotionRepository::new(state.pool())
        .detach(product_id, promotion_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_discount_rejected() {
        let body = PromotionBody {
            description: "Spring sale".to_string(),
            discount: -0.5,
        };
        assert!(body.validate().unwrap_err().field_errors().contains_key("discount"));
    }

    #[test]
    fn test_blank_description_rejected() {
        let body = PromotionBody {
            description: String::new(),
            discount: 0.1,
        };
        assert!(body.validate().unwrap_err().field_errors().contains_key("description"));
    }
}
