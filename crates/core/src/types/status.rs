//! Status enums for orders and customers.
//!
//! Both enums persist as single-character codes and serialize the same way,
//! so API clients and the database agree on one spelling.

use serde::{Deserialize, Serialize};

/// Error returned when a status code or name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{value}\" is not a valid choice.")]
pub struct StatusParseError {
    /// The rejected input.
    pub value: String,
}

impl StatusParseError {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }
}

/// Order payment status.
///
/// A static field: nothing in the store transitions it automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    #[serde(rename = "P")]
    Pending,
    #[serde(rename = "C")]
    Complete,
    #[serde(rename = "F")]
    Failed,
}

impl PaymentStatus {
    /// Single-character storage code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Complete => "C",
            Self::Failed => "F",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StatusParseError;

    /// Accepts the storage code or the label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p" | "pending" => Ok(Self::Pending),
            "c" | "complete" => Ok(Self::Complete),
            "f" | "failed" => Ok(Self::Failed),
            _ => Err(StatusParseError::new(s)),
        }
    }
}

/// Customer membership tier.
///
/// A passive classification; there is no upgrade or downgrade logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Membership {
    #[default]
    #[serde(rename = "B")]
    Bronze,
    #[serde(rename = "S")]
    Silver,
    #[serde(rename = "G")]
    Gold,
}

impl Membership {
    /// Single-character storage code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Bronze => "B",
            Self::Silver => "S",
            Self::Gold => "G",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Membership {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "bronze" => Ok(Self::Bronze),
            "s" | "silver" => Ok(Self::Silver),
            "g" | "gold" => Ok(Self::Gold),
            _ => Err(StatusParseError::new(s)),
        }
    }
}

/// `sqlx` impls for a code-backed enum stored in a `VARCHAR(1)` column.
#[cfg(feature = "postgres")]
macro_rules! impl_code_column {
    ($name:ident) => {
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let code = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(code.parse()?)
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.code(), buf)
            }
        }
    };
}

#[cfg(feature = "postgres")]
impl_code_column!(PaymentStatus);
#[cfg(feature = "postgres")]
impl_code_column!(Membership);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(Membership::default(), Membership::Bronze);
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Complete).unwrap(),
            "\"C\""
        );
        assert_eq!(serde_json::to_string(&Membership::Gold).unwrap(), "\"G\"");
        let status: PaymentStatus = serde_json::from_str("\"F\"").unwrap();
        assert_eq!(status, PaymentStatus::Failed);
        assert!(serde_json::from_str::<Membership>("\"X\"").is_err());
    }

    #[test]
    fn test_parse_accepts_code_and_label() {
        assert_eq!("complete".parse::<PaymentStatus>().unwrap(), PaymentStatus::Complete);
        assert_eq!("P".parse::<PaymentStatus>().unwrap(), PaymentStatus::Pending);
        assert_eq!("Silver".parse::<Membership>().unwrap(), Membership::Silver);
        assert_eq!("g".parse::<Membership>().unwrap(), Membership::Gold);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "platinum".parse::<Membership>().unwrap_err();
        assert_eq!(err.to_string(), "\"platinum\" is not a valid choice.");
    }
}
