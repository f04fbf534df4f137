//! Tag repository.
//!
//! Attachments reference their target by `(content_type, object_id)` only;
//! there is no foreign key to the tagged row. Callers resolve targets through
//! [`crate::services::tagging::TargetRegistry`].

use sqlx::PgPool;

use aladabuy_core::{TagItemId, TaggedRef};

use super::RepositoryError;
use crate::models::{Tag, TagItem};

/// Repository for tag database operations.
pub struct TagRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepository<'a> {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a tag by label.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_label(&self, label: &str) -> Result<Option<Tag>, RepositoryError> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, label FROM tags.tag WHERE label = $1")
            .bind(label)
            .fetch_optional(self.pool)
            .await?;

        Ok(tag)
    }

    /// Every attachment of the tag with this label, across all content types.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, label: &str) -> Result<Vec<TagItem>, RepositoryError> {
        let items = sqlx::query_as::<_, TagItem>(
            r"
            SELECT ti.id, ti.tag_id, ti.content_type, ti.object_id
            FROM tags.tagged_item ti
            JOIN tags.tag t ON t.id = ti.tag_id
            WHERE t.label = $1
            ORDER BY ti.id
            ",
        )
        .bind(label)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Attach a tag (by label) to a target. Attaching twice returns the
    /// existing attachment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the label is blank.
    pub async fn attach(&self, label: &str, target: TaggedRef) -> Result<TagItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // The no-op update makes RETURNING yield the existing row on conflict
        let tag = sqlx::query_as::<_, Tag>(
            r"
            INSERT INTO tags.tag (label)
            VALUES ($1)
            ON CONFLICT (label) DO UPDATE SET label = EXCLUDED.label
            RETURNING id, label
            ",
        )
        .bind(label)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::on_write)?;

        let item = sqlx::query_as::<_, TagItem>(
            r"
            INSERT INTO tags.tagged_item (tag_id, content_type, object_id)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT tagged_item_target_key
            DO UPDATE SET object_id = EXCLUDED.object_id
            RETURNING id, tag_id, content_type, object_id
            ",
        )
        .bind(tag.id)
        .bind(target.content_type)
        .bind(target.object_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::on_write)?;

        tx.commit().await?;
        Ok(item)
    }

    /// Remove one attachment of the tag with this label.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such attachment exists.
    pub async fn detach(&self, label: &str, item: TagItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM tags.tagged_item ti
            USING tags.tag t
            WHERE ti.id = $2 AND ti.tag_id = t.id AND t.label = $1
            ",
        )
        .bind(label)
        .bind(item)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
