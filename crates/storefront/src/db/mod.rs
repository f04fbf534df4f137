//! Database operations for the store `PostgreSQL`.
//!
//! ## Schemas
//!
//! - `store` - catalog, carts, customers, addresses, orders
//! - `tags` - tags and their polymorphic attachments
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/`, embedded as
//! [`MIGRATOR`], and run via:
//! ```bash
//! cargo run -p aladabuy-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`sqlx::query_as::<_, T>`) so the crate
//! builds without a live database or an offline query cache.

pub mod addresses;
pub mod carts;
pub mod collections;
pub mod customers;
pub mod images;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod reviews;
pub mod tags;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use collections::CollectionRepository;
pub use customers::CustomerRepository;
pub use images::ImageRepository;
pub use orders::OrderRepository;
pub use products::{ProductFilter, ProductOrdering, ProductRepository};
pub use promotions::PromotionRepository;
pub use reviews::ReviewRepository;
pub use tags::TagRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLSTATE for `numeric_value_out_of_range` (e.g. a `SMALLINT` overflow).
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Delete blocked by a protecting foreign key.
    #[error("protected: {0}")]
    Protected(String),

    /// Write rejected by a check, range or reference constraint.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl RepositoryError {
    /// Classify an error raised by an `INSERT` or `UPDATE`.
    ///
    /// A foreign key failure here means the referenced row is missing.
    pub(crate) fn on_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            let constraint = db_err.constraint().unwrap_or_default().to_owned();
            if db_err.is_unique_violation() {
                return Self::Conflict(constraint);
            }
            if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                return Self::Invalid(constraint);
            }
            if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
                return Self::Invalid(db_err.message().to_owned());
            }
        }
        Self::Database(e)
    }

    /// Classify an error raised by a `DELETE`.
    ///
    /// A foreign key failure here means dependants still reference the row.
    pub(crate) fn on_delete(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return Self::Protected(db_err.constraint().unwrap_or_default().to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        assert!(matches!(
            RepositoryError::on_write(sqlx::Error::RowNotFound),
            RepositoryError::Database(sqlx::Error::RowNotFound)
        ));
        assert!(matches!(
            RepositoryError::on_delete(sqlx::Error::PoolTimedOut),
            RepositoryError::Database(sqlx::Error::PoolTimedOut)
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            RepositoryError::Protected("order_customer_id_fkey".to_string()).to_string(),
            "protected: order_customer_id_fkey"
        );
    }
}
