//! Product review handlers. Reviews are public and scoped to the product in
//! the path.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{ProductId, ReviewId};

use crate::db::{ProductRepository, ReviewRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::models::Review;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewBody {
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub name: String,
    #[validate(custom(function = "validation::not_blank"))]
    pub description: String,
}

/// List a product's reviews.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    if !ProductRepository::new(state.pool()).exists(product_id).await? {
        return Err(AppError::not_found());
    }
    Ok(Json(
        ReviewRepository::new(state.pool())
            .for_product(product_id)
            .await?,
    ))
}

/// Post a review.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    ValidJson(body): ValidJson<ReviewBody>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewRepository::new(state.pool())
        .create(product_id, body.name.trim(), body.description.trim())
        .await
        .map_err(|e| match e {
            // The only reference on a review is its product
            RepositoryError::Invalid(_) => AppError::not_found(),
            other => other.into(),
        })?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Show one review.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((product_id, review_id)): Path<(ProductId, ReviewId)>,
) -> Result<Json<Review>> {
    let review = ReviewRepository::new(state.pool())
        .get(review_id)
        .await?
        .filter(|r| r.product_id == product_id)
        .ok_or_else(AppError::not_found)?;
    Ok(Json(review))
}

/// Edit a review.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path((product_id, review_id)): Path<(ProductId, ReviewId)>,
    ValidJson(body): ValidJson<ReviewBody>,
) -> Result<Json<Review>> {
    let review = ReviewRepository::new(state.pool())
        .update(
            product_id,
            review_id,
            body.name.trim(),
            body.description.trim(),
        )
        .await?;
    Ok(Json(review))
}

/// Delete a review.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path((product_id, review_id)): Path<(ProductId, ReviewId)>,
) -> Result<StatusCode> {
    ReviewRepository::new(state.pool())
        .delete(product_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_rejected() {
        let body: ReviewBody =
            serde_json::from_str(r#"{"name":" ","description":""}"#).unwrap();
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn test_valid_body() {
        let body: ReviewBody =
            serde_json::from_str(r#"{"name":"Ada","description":"Crusty."}"#).unwrap();
        assert!(body.validate().is_ok());
    }
}
