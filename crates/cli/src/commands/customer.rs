//! Customer provisioning.
//!
//! The API never creates a customer on its own, so a user must be given a
//! profile here (or by staff through the API) before they can check out.

use chrono::NaiveDate;

use aladabuy_core::{Membership, UserId};
use aladabuy_storefront::db::{CustomerRepository, RepositoryError};
use aladabuy_storefront::models::CustomerInput;

use super::{CommandError, connect};

/// Build the profile, rejecting values the API would reject.
///
/// # Errors
///
/// Returns `CommandError::Invalid` describing the first bad argument.
pub fn profile(
    user_id: i32,
    phone: &str,
    birth_date: Option<NaiveDate>,
    membership: &str,
) -> Result<(UserId, CustomerInput), CommandError> {
    if user_id < 1 {
        return Err(CommandError::Invalid(format!(
            "user id must be positive, got {user_id}"
        )));
    }
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(CommandError::Invalid("phone may not be blank".to_string()));
    }
    let membership = membership
        .parse::<Membership>()
        .map_err(|e| CommandError::Invalid(e.to_string()))?;

    Ok((
        UserId::new(user_id),
        CustomerInput {
            phone: phone.to_string(),
            birth_date,
            membership,
        },
    ))
}

/// Create a customer profile for a user.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the user already has a
/// profile, or the database is unreachable.
pub async fn create(
    user_id: i32,
    phone: &str,
    birth_date: Option<NaiveDate>,
    membership: &str,
) -> Result<(), CommandError> {
    let (user, input) = profile(user_id, phone, birth_date, membership)?;
    let pool = connect().await?;

    let customer = CustomerRepository::new(&pool)
        .create(user, &input)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                CommandError::Invalid(format!("user {user} already has a customer profile"))
            }
            other => other.into(),
        })?;

    tracing::info!(
        customer_id = %customer.id,
        user_id = %customer.user_id,
        membership = %customer.membership,
        "Customer created"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile() {
        let (user, input) = profile(42, " 555-0100 ", None, "silver").unwrap();
        assert_eq!(user, UserId::new(42));
        assert_eq!(input.phone, "555-0100");
        assert_eq!(input.membership, Membership::Silver);
    }

    #[test]
    fn test_profile_rejects_bad_arguments() {
        assert!(profile(0, "555-0100", None, "B").is_err());
        assert!(profile(1, "  ", None, "B").is_err());
        assert!(profile(1, "555-0100", None, "platinum").is_err());
    }
}
