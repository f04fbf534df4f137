//! Tag handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{ContentType, TagItemId, TaggedRef};

use crate::db::CustomerRepository;
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::middleware::{CurrentUser, OptionalUser, RequireStaff};
use crate::services::{ResolvedItem, TaggingService, Viewer};
use crate::state::AppState;
use crate::validation::convert;

/// Longest accepted tag label.
const MAX_LABEL_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagItemView {
    pub id: TagItemId,
    pub content_type: ContentType,
    pub object_id: i32,
    /// The tagged object, or `null` if it has been deleted or the caller may
    /// not see it.
    pub object: Option<Value>,
}

impl From<ResolvedItem> for TagItemView {
    fn from(resolved: ResolvedItem) -> Self {
        Self {
            id: resolved.item.id,
            content_type: resolved.item.content_type,
            object_id: resolved.item.object_id,
            object: resolved.object,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachBody {
    pub content_type: String,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub object_id: i32,
}

impl AttachBody {
    fn target(&self) -> Result<TaggedRef> {
        let content_type = convert("content_type", self.content_type.trim().parse::<ContentType>())?;
        Ok(TaggedRef::new(content_type, self.object_id))
    }
}

/// Normalize a label from the path. Blank or oversized labels name no tag.
fn label(raw: &str) -> Result<&str> {
    let label = raw.trim();
    if label.is_empty() || label.chars().count() > MAX_LABEL_LEN {
        return Err(AppError::not_found());
    }
    Ok(label)
}

async fn viewer(state: &AppState, user: Option<CurrentUser>) -> Result<Viewer> {
    let Some(user) = user else {
        return Ok(Viewer::Anonymous);
    };
    if user.is_staff {
        return Ok(Viewer::Staff);
    }
    Ok(CustomerRepository::new(state.pool())
        .get_by_user(user.id)
        .await?
        .map_or(Viewer::Anonymous, |c| Viewer::Customer(c.id)))
}

/// Every object carrying a tag.
#[instrument(skip(state, user))]
pub async fn items(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(raw): Path<String>,
) -> Result<Json<Vec<TagItemView>>> {
    let label = label(&raw)?;
    let viewer = viewer(&state, user).await?;
    let items = TaggingService::new(state.pool(), state.targets())
        .items(label, viewer)
        .await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Tag an object, creating the tag on first use.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn attach(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(raw): Path<String>,
    ValidJson(body): ValidJson<AttachBody>,
) -> Result<(StatusCode, Json<TagItemView>)> {
    let target = body.target()?;
    let item = TaggingService::new(state.pool(), state.targets())
        .attach(label(&raw)?, target)
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// Remove a tag from an object.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn detach(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path((raw, item_id)): Path<(String, TagItemId)>,
) -> Result<StatusCode> {
    TaggingService::new(state.pool(), state.targets())
        .detach(label(&raw)?, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_label_normalization() {
        assert_eq!(label("  summer ").unwrap(), "summer");
        assert!(label("   ").is_err());
        assert!(label(&"x".repeat(MAX_LABEL_LEN + 1)).is_err());
    }

    #[test]
    fn test_attach_body_target() {
        let body: AttachBody =
            serde_json::from_str(r#"{"content_type":"store.order","object_id":12}"#).unwrap();
        assert_eq!(body.target().unwrap().to_string(), "store.order#12");
    }

    #[test]
    fn test_unknown_content_type_is_a_field_error() {
        let body: AttachBody =
            serde_json::from_str(r#"{"content_type":"auth.user","object_id":1}"#).unwrap();
        let AppError::Validation(fields) = body.target().unwrap_err() else {
            unreachable!("expected a validation error");
        };
        assert!(fields.contains_key("content_type"));
    }
}
