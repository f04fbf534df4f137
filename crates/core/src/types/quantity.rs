//! Line-item quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("Ensure this value is greater than or equal to {min}.")]
    NotPositive {
        /// Minimum allowed quantity.
        min: u16,
    },
    /// Larger than a `SMALLINT` column can hold.
    #[error("Ensure this value is less than or equal to {max}.")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u16,
    },
}

/// A positive number of units on a cart or order line.
///
/// Backed by a `SMALLINT` column, so the range is `1..=32767`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct Quantity(u16);

impl Quantity {
    /// Smallest accepted quantity.
    pub const MIN: u16 = 1;
    /// Largest accepted quantity (`i16::MAX`).
    pub const MAX: u16 = 32_767;

    /// Validate and wrap a quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in `1..=32767`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < i64::from(Self::MIN) {
            return Err(QuantityError::NotPositive { min: Self::MIN });
        }
        u16::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// The raw count.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// The count as the `SMALLINT` the database stores.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // MAX == i16::MAX
    pub const fn as_i16(&self) -> i16 {
        self.0 as i16
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u16 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::postgres::PgHasArrayType for Quantity {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::postgres::PgHasArrayType>::array_type_info()
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_i16(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(Quantity::new(1).is_ok());
        assert!(Quantity::new(32_767).is_ok());
        assert_eq!(
            Quantity::new(0),
            Err(QuantityError::NotPositive { min: 1 })
        );
        assert_eq!(
            Quantity::new(-3),
            Err(QuantityError::NotPositive { min: 1 })
        );
        assert_eq!(
            Quantity::new(32_768),
            Err(QuantityError::TooLarge { max: 32_767 })
        );
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            QuantityError::NotPositive { min: 1 }.to_string(),
            "Ensure this value is greater than or equal to 1."
        );
    }
}
