//! Collection repository.

use sqlx::PgPool;

use aladabuy_core::{CollectionId, ProductId};

use super::RepositoryError;
use crate::models::Collection;

/// Repository for collection database operations.
pub struct CollectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all collections ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Collection>, RepositoryError> {
        let collections = sqlx::query_as::<_, Collection>(
            r"
            SELECT id, title, featured_product_id
            FROM store.collection
            ORDER BY title, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(collections)
    }

    /// Get a collection by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT id, title, featured_product_id FROM store.collection WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(collection)
    }

    /// Create a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the featured product does not exist.
    pub async fn create(
        &self,
        title: &str,
        featured_product: Option<ProductId>,
    ) -> Result<Collection, RepositoryError> {
        sqlx::query_as::<_, Collection>(
            r"
            INSERT INTO store.collection (title, featured_product_id)
            VALUES ($1, $2)
            RETURNING id, title, featured_product_id
            ",
        )
        .bind(title)
        .bind(featured_product)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_write)
    }

    /// Replace a collection's title and featured product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection does not exist.
    /// Returns `RepositoryError::Invalid` if the featured product does not exist.
    pub async fn update(
        &self,
        id: CollectionId,
        title: &str,
        featured_product: Option<ProductId>,
    ) -> Result<Collection, RepositoryError> {
        sqlx::query_as::<_, Collection>(
            r"
            UPDATE store.collection
            SET title = $2, featured_product_id = $3
            WHERE id = $1
            RETURNING id, title, featured_product_id
            ",
        )
        .bind(id)
        .bind(title)
        .bind(featured_product)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::on_write)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection does not exist.
    pub async fn delete(&self, id: CollectionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.collection WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(RepositoryError::on_delete)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
