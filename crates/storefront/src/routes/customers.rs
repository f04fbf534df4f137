//! Customer and address handlers.
//!
//! Staff manage every customer by ID. Any authenticated user can read and
//! edit their own profile at `/me`, but profiles are only ever created by
//! staff or the CLI.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{CustomerId, Membership, UserId};

use crate::db::{AddressRepository, CustomerRepository};
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::middleware::{CurrentUser, RequireStaff, RequireUser};
use crate::models::{Address, Customer, CustomerInput};
use crate::state::AppState;
use crate::validation::{self, convert};

/// Editable profile fields.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileBody {
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Tier code (`B`/`S`/`G`) or name; Bronze when omitted.
    #[validate(custom(function = "validation::membership"))]
    pub membership: Option<String>,
}

impl ProfileBody {
    fn into_input(self) -> Result<CustomerInput> {
        let membership = match self.membership.as_deref() {
            Some(raw) => convert("membership", raw.parse::<Membership>())?,
            None => Membership::default(),
        };
        Ok(CustomerInput {
            phone: self.phone.trim().to_string(),
            birth_date: self.birth_date,
            membership,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerBody {
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub user_id: i32,
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[validate(custom(function = "validation::membership"))]
    pub membership: Option<String>,
}

impl CreateCustomerBody {
    fn split(self) -> (UserId, ProfileBody) {
        (
            UserId::new(self.user_id),
            ProfileBody {
                phone: self.phone,
                birth_date: self.birth_date,
                membership: self.membership,
            },
        )
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressBody {
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub street: String,
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub city: String,
}

async fn own_customer(state: &AppState, user: &CurrentUser) -> Result<Customer> {
    CustomerRepository::new(state.pool())
        .get_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No customer profile for this user.".to_string()))
}

/// List customers.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Vec<Customer>>> {
    Ok(Json(CustomerRepository::new(state.pool()).list().await?))
}

/// Create a customer for a user.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidJson(body): ValidJson<CreateCustomerBody>,
) -> Result<(StatusCode, Json<Customer>)> {
    let (user, profile) = body.split();
    let input = profile.into_input()?;
    let customer = CustomerRepository::new(state.pool())
        .create(user, &input)
        .await?;
    tracing::info!(customer_id = %customer.id, customer_user = %user, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Show one customer.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Customer>> {
    let customer = CustomerRepository::new(state.pool())
        .get(customer_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(customer))
}

/// Replace a customer's profile.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(customer_id): Path<CustomerId>,
    ValidJson(body): ValidJson<ProfileBody>,
) -> Result<Json<Customer>> {
    let input = body.into_input()?;
    let customer = CustomerRepository::new(state.pool())
        .update(customer_id, &input)
        .await?;
    Ok(Json(customer))
}

/// Delete a customer. Fails with 409 while orders or addresses exist.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(customer_id): Path<CustomerId>,
) -> Result<StatusCode> {
    CustomerRepository::new(state.pool())
        .delete(customer_id)
        .await?;
    tracing::info!(%customer_id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own profile.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Customer>> {
    Ok(Json(own_customer(&state, &user).await?))
}

/// Update the caller's own profile.
#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ValidJson(body): ValidJson<ProfileBody>,
) -> Result<Json<Customer>> {
    let customer = own_customer(&state, &user).await?;
    let input = body.into_input()?;
    let updated = CustomerRepository::new(state.pool())
        .update(customer.id, &input)
        .await?;
    Ok(Json(updated))
}

/// The caller's addresses.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Address>>> {
    let customer = own_customer(&state, &user).await?;
    Ok(Json(
        AddressRepository::new(state.pool())
            .for_customer(customer.id)
            .await?,
    ))
}

/// Add an address for the caller.
#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ValidJson(body): ValidJson<AddressBody>,
) -> Result<(StatusCode, Json<Address>)> {
    let customer = own_customer(&state, &user).await?;
    let address = AddressRepository::new(state.pool())
        .create(customer.id, body.street.trim(), body.city.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults_to_bronze() {
        let body: ProfileBody = serde_json::from_str(r#"{"phone":"555-0100"}"#).unwrap();
        let input = body.into_input().unwrap();
        assert_eq!(input.membership, Membership::Bronze);
        assert_eq!(input.birth_date, None);
    }

    #[test]
    fn test_profile_accepts_tier_names() {
        let body: ProfileBody =
            serde_json::from_str(r#"{"phone":"555-0100","membership":"gold","birth_date":"1990-04-01"}"#)
                .unwrap();
        assert!(body.validate().is_ok());
        let input = body.into_input().unwrap();
        assert_eq!(input.membership, Membership::Gold);
        assert_eq!(input.birth_date, NaiveDate::from_ymd_opt(1990, 4, 1));
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let body: ProfileBody =
            serde_json::from_str(r#"{"phone":"555-0100","membership":"platinum"}"#).unwrap();
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("membership"));
    }

    #[test]
    fn test_create_body_validation() {
        let body: CreateCustomerBody =
            serde_json::from_str(r#"{"user_id":0,"phone":" "}"#).unwrap();
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_id"));
        assert!(errors.field_errors().contains_key("phone"));
    }

    #[test]
    fn test_create_body_split() {
        let body: CreateCustomerBody =
            serde_json::from_str(r#"{"user_id":42,"phone":"555-0100","membership":"S"}"#).unwrap();
        let (user, profile) = body.split();
        assert_eq!(user, UserId::new(42));
        assert_eq!(profile.into_input().unwrap().membership, Membership::Silver);
    }
}
