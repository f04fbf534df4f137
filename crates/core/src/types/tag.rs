//! Polymorphic tag targets.
//!
//! A tag can be attached to any entity without that entity knowing about it.
//! The attachment stores a [`ContentType`] discriminator plus the target's
//! integer primary key; resolving it back to a row is the storefront's job.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for an unknown content type label.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid content type \"{0}\".")]
pub struct ContentTypeError(pub String);

/// Entity kinds that can carry tags.
///
/// Labels follow the `app.model` convention, e.g. `store.product`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "store.product")]
    Product,
    #[serde(rename = "store.collection")]
    Collection,
    #[serde(rename = "store.customer")]
    Customer,
    #[serde(rename = "store.order")]
    Order,
    #[serde(rename = "store.review")]
    Review,
}

impl ContentType {
    /// Every taggable kind.
    pub const ALL: [Self; 5] = [
        Self::Product,
        Self::Collection,
        Self::Customer,
        Self::Order,
        Self::Review,
    ];

    /// The stored label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Product => "store.product",
            Self::Collection => "store.collection",
            Self::Customer => "store.customer",
            Self::Order => "store.order",
            Self::Review => "store.review",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ContentType {
    type Err = ContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.label() == s)
            .ok_or_else(|| ContentTypeError(s.to_owned()))
    }
}

/// A reference to one tagged entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggedRef {
    pub content_type: ContentType,
    pub object_id: i32,
}

impl TaggedRef {
    #[must_use]
    pub const fn new(content_type: ContentType, object_id: i32) -> Self {
        Self {
            content_type,
            object_id,
        }
    }
}

impl fmt::Display for TaggedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.content_type, self.object_id)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ContentType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ContentType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let label = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(label.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ContentType {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.label(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for ct in ContentType::ALL {
            assert_eq!(ct.label().parse::<ContentType>().unwrap(), ct);
        }
    }

    #[test]
    fn test_unknown_label() {
        let err = "auth.user".parse::<ContentType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid content type \"auth.user\".");
    }

    #[test]
    fn test_tagged_ref_json() {
        let r: TaggedRef =
            serde_json::from_str(r#"{"content_type":"store.order","object_id":12}"#).unwrap();
        assert_eq!(r, TaggedRef::new(ContentType::Order, 12));
        assert_eq!(r.to_string(), "store.order#12");
    }
}
