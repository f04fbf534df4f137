//! Promotion repository and the product/promotion link table.

use sqlx::PgPool;

use aladabuy_core::{ProductId, PromotionId};

use super::RepositoryError;
use crate::models::Promotion;

/// Repository for promotion database operations.
pub struct PromotionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromotionRepository<'a> {
    /// Create a new promotion repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all promotions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let promotions = sqlx::query_as::<_, Promotion>(
            "SELECT id, description, discount FROM store.promotion ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(promotions)
    }

    /// Get a promotion by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PromotionId) -> Result<Option<Promotion>, RepositoryError> {
        let promotion = sqlx::query_as::<_, Promotion>(
            "SELECT id, description, discount FROM store.promotion WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(promotion)
    }

    /// Create a promotion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the discount is negative.
    pub async fn create(
        &self,
        description: &str,
        discount: f64,
    ) -> Result<Promotion, RepositoryError> {
        sqlx::query_as::<_, Promotion>(
            r"
            INSERT INTO store.promotion (description, discount)
            VALUES ($1, $2)
            RETURNING id, description, discount
            ",
        )
        .bind(description)
        .bind(discount)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_write)
    }

    /// Promotions attached to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(&self, product: ProductId) -> Result<Vec<Promotion>, RepositoryError> {
        let promotions = sqlx::query_as::<_, Promotion>(
            r"
            SELECT p.id, p.description, p.discount
            FROM store.promotion p
            JOIN store.product_promotion pp ON pp.promotion_id = p.id
            WHERE pp.product_id = $1
            ORDER BY p.id
            ",
        )
        .bind(product)
        .fetch_all(self.pool)
        .await?;

        Ok(promotions)
    }

    /// Attach a promotion to a product. Attaching twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if either side does not exist.
    pub async fn attach(
        &self,
        product: ProductId,
        promotion: PromotionId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store.product_promotion (product_id, promotion_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(product)
        .bind(promotion)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::on_write)?;

        Ok(())
    }

    /// Detach a promotion from a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promotion was not attached.
    pub async fn detach(
        &self,
        product: ProductId,
        promotion: PromotionId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM store.product_promotion WHERE product_id = $1 AND promotion_id = $2",
        )
        .bind(product)
        .bind(promotion)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
