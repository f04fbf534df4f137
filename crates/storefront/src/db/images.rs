//! Product image repository. Files live on disk; rows hold their paths.

use sqlx::PgPool;

use aladabuy_core::{ProductId, ProductImageId};

use super::RepositoryError;
use crate::models::ProductImage;

/// Repository for product image database operations.
pub struct ImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepository<'a> {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Images of one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        self.for_products(&[product]).await
    }

    /// Images of several products in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_products(
        &self,
        products: &[ProductId],
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(
            r"
            SELECT id, product_id, image
            FROM store.product_image
            WHERE product_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(products)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Get one image of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        product: ProductId,
        id: ProductImageId,
    ) -> Result<Option<ProductImage>, RepositoryError> {
        let image = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, image FROM store.product_image WHERE id = $1 AND product_id = $2",
        )
        .bind(id)
        .bind(product)
        .fetch_optional(self.pool)
        .await?;

        Ok(image)
    }

    /// Record an uploaded image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the product does not exist.
    pub async fn create(
        &self,
        product: ProductId,
        path: &str,
    ) -> Result<ProductImage, RepositoryError> {
        sqlx::query_as::<_, ProductImage>(
            r"
            INSERT INTO store.product_image (product_id, image)
            VALUES ($1, $2)
            RETURNING id, product_id, image
            ",
        )
        .bind(product)
        .bind(path)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_write)
    }

    /// Delete an image row, returning it so the caller can remove the file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not exist.
    pub async fn delete(
        &self,
        product: ProductId,
        id: ProductImageId,
    ) -> Result<ProductImage, RepositoryError> {
        sqlx::query_as::<_, ProductImage>(
            r"
            DELETE FROM store.product_image
            WHERE id = $1 AND product_id = $2
            RETURNING id, product_id, image
            ",
        )
        .bind(id)
        .bind(product)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
