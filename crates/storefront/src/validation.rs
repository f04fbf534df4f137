//! Field validators for request bodies.
//!
//! Each validator defers to the matching `aladabuy-core` constructor. Used
//! via `#[validate(custom(function = "..."))]`.

use std::borrow::{Borrow, Cow};
use std::fmt::Display;

use rust_decimal::Decimal;
use validator::ValidationError;

use aladabuy_core::{Membership, PaymentStatus, Quantity, Slug, UnitPrice};

use crate::error::AppError;

fn invalid(code: &'static str, message: impl Display) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message.to_string()))
}

/// Reject empty or whitespace-only text.
///
/// # Errors
///
/// Returns a `blank` error for blank input.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("blank", "This field may not be blank."))
    } else {
        Ok(())
    }
}

/// # Errors
///
/// Returns an error if the amount is not a valid [`UnitPrice`].
pub fn unit_price(value: &Decimal) -> Result<(), ValidationError> {
    UnitPrice::new(*value)
        .map(|_| ())
        .map_err(|e| invalid("unit_price", e))
}

/// # Errors
///
/// Returns an error if the count is not a valid [`Quantity`].
#[allow(clippy::needless_pass_by_value)]
pub fn quantity(value: impl Borrow<i64>) -> Result<(), ValidationError> {
    Quantity::new(*value.borrow())
        .map(|_| ())
        .map_err(|e| invalid("quantity", e))
}

/// # Errors
///
/// Returns an error if the text is not a valid [`Slug`].
pub fn slug(value: &str) -> Result<(), ValidationError> {
    Slug::parse(value).map(|_| ()).map_err(|e| invalid("slug", e))
}

/// # Errors
///
/// Returns an error unless the text names a membership tier.
pub fn membership(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Membership>()
        .map(|_| ())
        .map_err(|e| invalid("choice", e))
}

/// # Errors
///
/// Returns an error unless the text names a payment status.
pub fn payment_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<PaymentStatus>()
        .map(|_| ())
        .map_err(|e| invalid("choice", e))
}

/// Convert an already validated field into its domain type.
///
/// # Errors
///
/// Returns `AppError::Validation` on `field` if conversion fails.
pub fn convert<T, E: Display>(field: &str, result: Result<T, E>) -> Result<T, AppError> {
    result.map_err(|e| AppError::field(field, e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Bread").is_ok());
        let err = not_blank("   ").unwrap_err();
        assert_eq!(err.message.unwrap(), "This field may not be blank.");
    }

    #[test]
    fn test_unit_price_bounds() {
        assert!(unit_price(&Decimal::new(100, 2)).is_ok());
        assert!(unit_price(&Decimal::new(999_999, 2)).is_ok());
        assert!(unit_price(&Decimal::new(99, 2)).is_err());
        assert!(unit_price(&Decimal::new(1_000_000, 2)).is_err());
        assert!(unit_price(&Decimal::new(1001, 3)).is_err());
    }

    #[test]
    fn test_quantity_message() {
        let err = quantity(&0).unwrap_err();
        assert_eq!(
            err.message.unwrap(),
            "Ensure this value is greater than or equal to 1."
        );
        assert!(quantity(&32_767).is_ok());
        assert!(quantity(&32_768).is_err());
    }

    #[test]
    fn test_choices() {
        assert!(membership("gold").is_ok());
        assert!(membership("G").is_ok());
        assert_eq!(
            membership("platinum").unwrap_err().message.unwrap(),
            "\"platinum\" is not a valid choice."
        );
        assert!(payment_status("C").is_ok());
        assert!(payment_status("refunded").is_err());
    }

    #[test]
    fn test_slug() {
        assert!(slug("fresh-bread").is_ok());
        assert!(slug("fresh bread").is_err());
    }

    #[test]
    fn test_convert_reports_field() {
        let err = convert::<Quantity, _>("quantity", Quantity::new(-1)).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref f) if f.contains_key("quantity")));
    }
}
