//! Collection route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{CollectionId, ProductId};

use crate::db::{CollectionRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::middleware::RequireStaff;
use crate::models::Collection;
use crate::state::AppState;
use crate::validation;

/// Collection as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionView {
    pub id: CollectionId,
    pub title: String,
    pub featured_product: Option<ProductId>,
}

impl From<Collection> for CollectionView {
    fn from(c: Collection) -> Self {
        Self {
            id: c.id,
            title: c.title,
            featured_product: c.featured_product_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CollectionBody {
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub title: String,
    #[serde(default)]
    pub featured_product: Option<ProductId>,
}

/// Report a dangling featured product against the field that named it.
fn featured_product_error(err: RepositoryError, product: Option<ProductId>) -> AppError {
    match (err, product) {
        (RepositoryError::Invalid(_), Some(id)) => AppError::field(
            "featured_product",
            format!("Invalid pk \"{id}\" - object does not exist."),
        ),
        (err, _) => err.into(),
    }
}

/// List collections.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CollectionView>>> {
    let collections = CollectionRepository::new(state.pool()).list().await?;
    Ok(Json(collections.into_iter().map(Into::into).collect()))
}

/// Show one collection.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(collection_id): Path<CollectionId>,
) -> Result<Json<CollectionView>> {
    let collection = CollectionRepository::new(state.pool())
        .get(collection_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(collection.into()))
}

/// Create a collection.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidJson(body): ValidJson<CollectionBody>,
) -> Result<(StatusCode, Json<CollectionView>)> {
    let collection = CollectionRepository::new(state.pool())
        .create(body.title.trim(), body.featured_product)
        .await
        .map_err(|e| featured_product_error(e, body.featured_product))?;
    Ok((StatusCode::CREATED, Json(collection.into())))
}

/// Replace a collection.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(collection_id): Path<CollectionId>,
    ValidJson(body): ValidJson<CollectionBody>,
) -> Result<Json<CollectionView>> {
    let collection = CollectionRepository::new(state.pool())
        .update(collection_id, body.title.trim(), body.featured_product)
        .await
        .map_err(|e| featured_product_error(e, body.featured_product))?;
    Ok(Json(collection.into()))
}

/// Delete a collection. Products are unaffected.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(collection_id): Path<CollectionId>,
) -> Result<StatusCode> {
    CollectionRepository::new(state.pool())
        .delete(collection_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
