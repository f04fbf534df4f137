//! Customer profiles and their addresses.

use chrono::NaiveDate;
use serde::Serialize;

use aladabuy_core::{AddressId, CustomerId, Membership, UserId};

/// Store-side profile of an externally authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: UserId,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

/// Editable customer fields.
#[derive(Debug, Clone)]
pub struct CustomerInput {
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

/// A customer's postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub street: String,
    pub city: String,
    #[serde(rename = "customer")]
    pub customer_id: CustomerId,
}
