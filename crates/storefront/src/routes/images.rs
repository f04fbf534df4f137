//! Product image handlers.
//!
//! Uploads arrive as `multipart/form-data` with a single `image` field and
//! are streamed to `<media_root>/store/images/`. The size limit is checked
//! per chunk so oversized uploads are cut off without being buffered.

use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::Field},
    http::StatusCode,
};
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use aladabuy_core::{ProductId, ProductImageId};

use super::products::ImageView;
use crate::db::{ImageRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::ProductImage;
use crate::state::AppState;

/// Image directory relative to the media root.
pub const IMAGE_SUBDIR: &str = "store/images";

/// Multipart field carrying the file.
const IMAGE_FIELD: &str = "image";

/// Longest kept portion of the client's file name.
const MAX_NAME_LEN: usize = 100;

/// Reduce a client-supplied file name to a safe basename.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

fn multipart_error(err: &axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

/// Stream `field` into `dest`, failing once more than `limit` bytes arrive.
async fn write_limited(field: &mut Field<'_>, dest: &FsPath, limit: u64) -> Result<()> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| AppError::Internal(format!("create {}: {e}", dest.display())))?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e))? {
        written += chunk.len() as u64;
        if written > limit {
            return Err(AppError::field(
                IMAGE_FIELD,
                format!("The image may not be larger than {} KB.", limit / 1024),
            ));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("write {}: {e}", dest.display())))?;
    }

    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("flush {}: {e}", dest.display())))
}

/// Remove a stored image, logging rather than failing.
async fn remove_file(path: &FsPath) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove image file");
    }
}

/// List a product's images.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ImageView>>> {
    if !ProductRepository::new(state.pool()).exists(product_id).await? {
        return Err(AppError::not_found());
    }
    let images = ImageRepository::new(state.pool())
        .for_product(product_id)
        .await?;
    Ok(Json(images.iter().map(ImageView::from).collect()))
}

/// Show one image.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<Json<ImageView>> {
    let image = ImageRepository::new(state.pool())
        .get(product_id, image_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(ImageView::from(&image)))
}

/// Validate and store one uploaded file, recording it against the product.
async fn store_image(
    state: &AppState,
    product_id: ProductId,
    field: &mut Field<'_>,
) -> Result<ProductImage> {
    if !field
        .content_type()
        .is_some_and(|ct| ct.starts_with("image/"))
    {
        return Err(AppError::field(
            IMAGE_FIELD,
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        ));
    }

    let name = format!(
        "{}-{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(field.file_name().unwrap_or_default())
    );
    let dir = state.config().image_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("create {}: {e}", dir.display())))?;
    let dest = dir.join(&name);

    if let Err(e) = write_limited(field, &dest, state.config().max_image_bytes()).await {
        remove_file(&dest).await;
        return Err(e);
    }

    let relative = format!("{IMAGE_SUBDIR}/{name}");
    match ImageRepository::new(state.pool())
        .create(product_id, &relative)
        .await
    {
        Ok(image) => Ok(image),
        Err(e) => {
            remove_file(&dest).await;
            Err(e.into())
        }
    }
}

/// Upload an image for a product.
#[instrument(skip(state, multipart), fields(user_id = %staff.id))]
pub async fn upload(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(product_id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageView>)> {
    if !ProductRepository::new(state.pool()).exists(product_id).await? {
        return Err(AppError::BadRequest("Product does not exist".to_string()));
    }

    while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(&e))? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let image = store_image(&state, product_id, &mut field).await?;
        tracing::info!(%product_id, image_id = %image.id, path = %image.image, "Product image stored");
        return Ok((StatusCode::CREATED, Json(ImageView::from(&image))));
    }

    Err(AppError::field(IMAGE_FIELD, "No file was submitted."))
}

/// Delete an image and its file.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path((product_id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<StatusCode> {
    let image = ImageRepository::new(state.pool())
        .delete(product_id, image_id)
        .await?;
    remove_file(&state.config().media_root.join(&image.image)).await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\loaf.jpg"), "loaf.jpg");
    }

    #[test]
    fn test_sanitize_replaces_odd_characters() {
        assert_eq!(sanitize_file_name("rye bread (1).png"), "rye_bread__1_.png");
    }

    #[test]
    fn test_sanitize_hidden_and_empty_names() {
        assert_eq!(sanitize_file_name(".htaccess"), "htaccess");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("..."), "upload");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = format!("{}.jpg", "a".repeat(300));
        assert_eq!(sanitize_file_name(&long).len(), MAX_NAME_LEN);
    }
}
