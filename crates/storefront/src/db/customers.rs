//! Customer repository.
//!
//! A customer is keyed 1:1 to an external user ID. Customers are never
//! created implicitly; staff or the CLI provision them.

use sqlx::{PgConnection, PgPool};

use aladabuy_core::{CustomerId, UserId};

use super::RepositoryError;
use crate::models::{Customer, CustomerInput};

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let customers = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, user_id, phone, birth_date, membership
            FROM store.customer
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(customers)
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, user_id, phone, birth_date, membership FROM store.customer WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// Get the customer linked to an external user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user: UserId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, user_id, phone, birth_date, membership
            FROM store.customer
            WHERE user_id = $1
            ",
        )
        .bind(user)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// Create a customer for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a customer.
    pub async fn create(
        &self,
        user: UserId,
        input: &CustomerInput,
    ) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(
            r"
            INSERT INTO store.customer (user_id, phone, birth_date, membership)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, phone, birth_date, membership
            ",
        )
        .bind(user)
        .bind(&input.phone)
        .bind(input.birth_date)
        .bind(input.membership)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_write)
    }

    /// Replace a customer's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn update(
        &self,
        id: CustomerId,
        input: &CustomerInput,
    ) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(
            r"
            UPDATE store.customer
            SET phone = $2, birth_date = $3, membership = $4
            WHERE id = $1
            RETURNING id, user_id, phone, birth_date, membership
            ",
        )
        .bind(id)
        .bind(&input.phone)
        .bind(input.birth_date)
        .bind(input.membership)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::on_write)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Protected` while orders or addresses reference it.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.customer WHERE id = $1")
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

/// Resolve a user to their customer ID inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn id_for_user_in(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<Option<CustomerId>, RepositoryError> {
    let id = sqlx::query_scalar::<_, CustomerId>(
        "SELECT id FROM store.customer WHERE user_id = $1",
    )
    .bind(user)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}
