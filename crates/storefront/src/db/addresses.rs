//! Address repository.

use sqlx::PgPool;

use aladabuy_core::{AddressId, CustomerId};

use super::RepositoryError;
use crate::models::Address;

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Addresses of one customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_customer(&self, customer: CustomerId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(
            r"
            SELECT id, street, city, customer_id
            FROM store.address
            WHERE customer_id = $1
            ORDER BY id
            ",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Add an address to a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the customer does not exist.
    pub async fn create(
        &self,
        customer: CustomerId,
        street: &str,
        city: &str,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(
            r"
            INSERT INTO store.address (street, city, customer_id)
            VALUES ($1, $2, $3)
            RETURNING id, street, city, customer_id
            ",
        )
        .bind(street)
        .bind(city)
        .bind(customer)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_write)
    }

    /// Delete one of a customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the customer.
    pub async fn delete(&self, customer: CustomerId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.address WHERE id = $1 AND customer_id = $2")
            .bind(id)
            .bind(customer)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
