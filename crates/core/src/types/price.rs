//! Type-safe unit price using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(6, 2)`: at most four integer digits and two
//! decimal places, never below one currency unit.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Quantity;

/// Sales tax applied when presenting a tax-inclusive price.
pub const TAX_RATE: Decimal = Decimal::from_parts(11, 0, 0, false, 1);

/// Errors that can occur when constructing a [`UnitPrice`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below the minimum of 1.
    #[error("Ensure this value is greater than or equal to {min}.")]
    BelowMinimum {
        /// Minimum allowed amount.
        min: Decimal,
    },
    /// The amount does not fit in `NUMERIC(6, 2)`.
    #[error("Ensure that there are no more than {max_digits} digits in total.")]
    TooManyDigits {
        /// Maximum number of digits.
        max_digits: u32,
    },
    /// The amount has more than two decimal places.
    #[error("Ensure that there are no more than {max_places} decimal places.")]
    TooManyDecimalPlaces {
        /// Maximum decimal places.
        max_places: u32,
    },
}

/// A product's price for a single unit, before tax.
///
/// ## Constraints
///
/// - At least `1.00`
/// - At most `9999.99`
/// - At most two decimal places
///
/// ## Examples
///
/// ```
/// use aladabuy_core::UnitPrice;
/// use rust_decimal::Decimal;
///
/// let price = UnitPrice::new(Decimal::new(1000, 2)).unwrap();
/// assert_eq!(price.with_tax(), Decimal::new(1100, 2));
///
/// assert!(UnitPrice::new(Decimal::new(99, 2)).is_err()); // 0.99
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    /// Smallest accepted price.
    pub const MIN: Decimal = Decimal::ONE;
    /// Total digits allowed by the column.
    pub const MAX_DIGITS: u32 = 6;
    /// Decimal places allowed by the column.
    pub const DECIMAL_PLACES: u32 = 2;

    /// Validate and wrap an amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is below 1, has more than two decimal
    /// places, or exceeds `9999.99`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Self::MIN {
            return Err(PriceError::BelowMinimum { min: Self::MIN });
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces {
                max_places: Self::DECIMAL_PLACES,
            });
        }

        if amount >= Self::ceiling() {
            return Err(PriceError::TooManyDigits {
                max_digits: Self::MAX_DIGITS,
            });
        }

        let mut amount = normalized;
        amount.rescale(Self::DECIMAL_PLACES);
        Ok(Self(amount))
    }

    /// Exclusive upper bound implied by `NUMERIC(6, 2)`.
    fn ceiling() -> Decimal {
        Decimal::from(10_i64.pow(Self::MAX_DIGITS - Self::DECIMAL_PLACES))
    }

    /// The pre-tax amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The tax-inclusive amount, rounded to cents.
    ///
    /// Derived on every read; never persisted.
    #[must_use]
    pub fn with_tax(&self) -> Decimal {
        (self.0 * TAX_RATE).round_dp(Self::DECIMAL_PLACES)
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn line_total(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.get())
    }
}

impl TryFrom<Decimal> for UnitPrice {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitPrice> for Decimal {
    fn from(price: UnitPrice) -> Self {
        price.0
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UnitPrice {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UnitPrice {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // The column carries a CHECK (unit_price >= 1), so this only fails on corruption
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UnitPrice {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_accepts_valid_prices() {
        assert!(UnitPrice::new(dec("1")).is_ok());
        assert!(UnitPrice::new(dec("10.50")).is_ok());
        assert!(UnitPrice::new(dec("9999.99")).is_ok());
    }

    #[test]
    fn test_rejects_below_minimum() {
        assert!(matches!(
            UnitPrice::new(dec("0.99")),
            Err(PriceError::BelowMinimum { .. })
        ));
        assert!(matches!(
            UnitPrice::new(dec("-5")),
            Err(PriceError::BelowMinimum { .. })
        ));
    }

    #[test]
    fn test_rejects_too_many_digits() {
        assert!(matches!(
            UnitPrice::new(dec("10000")),
            Err(PriceError::TooManyDigits { .. })
        ));
    }

    #[test]
    fn test_rejects_fractional_cents() {
        assert!(matches!(
            UnitPrice::new(dec("1.005")),
            Err(PriceError::TooManyDecimalPlaces { .. })
        ));
        // Trailing zeros are not significant
        assert!(UnitPrice::new(dec("1.5000")).is_ok());
    }

    #[test]
    fn test_with_tax() {
        assert_eq!(UnitPrice::new(dec("10")).unwrap().with_tax(), dec("11.00"));
        assert_eq!(UnitPrice::new(dec("19.99")).unwrap().with_tax(), dec("21.99"));
    }

    #[test]
    fn test_line_total() {
        let price = UnitPrice::new(dec("2.50")).unwrap();
        let quantity = Quantity::new(3).unwrap();
        assert_eq!(price.line_total(quantity), dec("7.50"));
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(UnitPrice::new(dec("5")).unwrap().to_string(), "5.00");
    }

    #[test]
    fn test_serde() {
        let price: UnitPrice = serde_json::from_str("\"12.30\"").unwrap();
        assert_eq!(price.amount(), dec("12.30"));
        assert!(serde_json::from_str::<UnitPrice>("\"0.10\"").is_err());
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"12.30\"");
    }
}
