//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! aladabuy migrate
//! ```
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in
//! the storefront crate as `db::MIGRATOR`.

use aladabuy_storefront::db::MIGRATOR;

use super::{CommandError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(available = MIGRATOR.iter().count(), "Running store migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Store migrations complete!");
    Ok(())
}
