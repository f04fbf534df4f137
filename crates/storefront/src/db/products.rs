//! Product repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use aladabuy_core::ProductId;

use super::RepositoryError;
use crate::models::{Product, ProductInput};

const PRODUCT_COLUMNS: &str =
    "id, title, slug, description, unit_price, inventory, last_update";

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrdering {
    #[default]
    Title,
    UnitPrice,
    UnitPriceDesc,
    LastUpdate,
    LastUpdateDesc,
}

impl ProductOrdering {
    /// `ORDER BY` clause; `id` breaks ties so pages are stable.
    const fn sql(self) -> &'static str {
        match self {
            Self::Title => "title ASC, id ASC",
            Self::UnitPrice => "unit_price ASC, id ASC",
            Self::UnitPriceDesc => "unit_price DESC, id ASC",
            Self::LastUpdate => "last_update ASC, id ASC",
            Self::LastUpdateDesc => "last_update DESC, id ASC",
        }
    }
}

impl std::str::FromStr for ProductOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "unit_price" => Ok(Self::UnitPrice),
            "-unit_price" => Ok(Self::UnitPriceDesc),
            "last_update" => Ok(Self::LastUpdate),
            "-last_update" => Ok(Self::LastUpdateDesc),
            _ => Err(format!("invalid ordering: {s}")),
        }
    }
}

/// Filters applied to a product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// Strictly greater than.
    pub unit_price_gt: Option<Decimal>,
    /// Strictly less than.
    pub unit_price_lt: Option<Decimal>,
    pub ordering: ProductOrdering,
}

/// Escape `LIKE` metacharacters and wrap in wildcards.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List one page of products matching `filter`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(contains_pattern);
        let predicate = r"
            ($1::text IS NULL OR title ILIKE $1)
            AND ($2::numeric IS NULL OR unit_price > $2)
            AND ($3::numeric IS NULL OR unit_price < $3)
        ";

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM store.product WHERE {predicate}"
        ))
        .bind(&search)
        .bind(filter.unit_price_gt)
        .bind(filter.unit_price_lt)
        .fetch_one(self.pool)
        .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product WHERE {predicate} \
             ORDER BY {} LIMIT $4 OFFSET $5",
            filter.ordering.sql()
        ))
        .bind(&search)
        .bind(filter.unit_price_gt)
        .bind(filter.unit_price_lt)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((products, count))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Check whether a product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM store.product WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if a column constraint rejects the row.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO store.product (title, slug, description, unit_price, inventory)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.unit_price)
        .bind(input.inventory)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_write)
    }

    /// Replace a product's editable fields and bump `last_update`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE store.product
            SET title = $2, slug = $3, description = $4, unit_price = $5,
                inventory = $6, last_update = CURRENT_DATE
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.unit_price)
        .bind(input.inventory)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::on_write)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product, cascading to its images, reviews, cart items and
    /// promotion links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Protected` if an order item references it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.product WHERE id = $1")
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse() {
        assert_eq!(
            "-unit_price".parse::<ProductOrdering>().unwrap(),
            ProductOrdering::UnitPriceDesc
        );
        assert_eq!(
            "last_update".parse::<ProductOrdering>().unwrap(),
            ProductOrdering::LastUpdate
        );
        assert!("price; DROP TABLE".parse::<ProductOrdering>().is_err());
    }

    #[test]
    fn test_default_ordering_is_title() {
        assert_eq!(ProductOrdering::default().sql(), "title ASC, id ASC");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("bread"), "%bread%");
    }
}
