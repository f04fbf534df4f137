//! Review repository.

use sqlx::PgPool;

use aladabuy_core::{ProductId, ReviewId};

use super::RepositoryError;
use crate::models::Review;

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of one product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(&self, product: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT id, product_id, name, description, date
            FROM store.review
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(product)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Get a review by ID regardless of product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, product_id, name, description, date FROM store.review WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(review)
    }

    /// Create a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the product does not exist.
    pub async fn create(
        &self,
        product: ProductId,
        name: &str,
        description: &str,
    ) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(
            r"
            INSERT INTO store.review (product_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, product_id, name, description, date
            ",
        )
        .bind(product)
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_write)
    }

    /// Replace a review's name and text.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists on the product.
    pub async fn update(
        &self,
        product: ProductId,
        id: ReviewId,
        name: &str,
        description: &str,
    ) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(
            r"
            UPDATE store.review
            SET name = $3, description = $4
            WHERE id = $1 AND product_id = $2
            RETURNING id, product_id, name, description, date
            ",
        )
        .bind(id)
        .bind(product)
        .bind(name)
        .bind(description)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists on the product.
    pub async fn delete(&self, product: ProductId, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.review WHERE id = $1 AND product_id = $2")
            .bind(id)
            .bind(product)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
