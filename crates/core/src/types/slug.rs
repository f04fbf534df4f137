//! URL-safe product slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("This field may not be blank.")]
    Empty,
    #[error("Ensure this field has no more than {max} characters.")]
    TooLong { max: usize },
    #[error("Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.")]
    InvalidCharacter,
}

/// A URL-safe identifier: ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum length of the `slug` column.
    pub const MAX_LEN: usize = 50;

    /// Parse a slug supplied by a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty, too long, or contains anything
    /// other than ASCII letters, digits, `_` and `-`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LEN {
            return Err(SlugError::TooLong { max: Self::MAX_LEN });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a product title.
    ///
    /// Lowercases, replaces every run of non-alphanumeric characters with a
    /// single hyphen, trims hyphens from both ends and truncates to
    /// [`Self::MAX_LEN`]. Returns `None` when nothing usable remains
    /// (e.g. a title made only of punctuation).
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        let mut slug = String::with_capacity(title.len());
        let mut pending_hyphen = false;

        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        slug.truncate(Self::MAX_LEN);
        let slug = slug.trim_end_matches('-');
        if slug.is_empty() {
            None
        } else {
            Some(Self(slug.to_owned()))
        }
    }

    /// Get the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Slug::parse("red-shoes_2").unwrap().as_str(), "red-shoes_2");
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("red shoes"), Err(SlugError::InvalidCharacter));
        assert_eq!(
            Slug::parse(&"a".repeat(51)),
            Err(SlugError::TooLong { max: 50 })
        );
    }

    #[test]
    fn test_from_title() {
        assert_eq!(
            Slug::from_title("  Bread - Crusty Italian!! ").unwrap().as_str(),
            "bread-crusty-italian"
        );
        assert_eq!(Slug::from_title("Coffee 1kg").unwrap().as_str(), "coffee-1kg");
    }

    #[test]
    fn test_from_title_without_alphanumerics() {
        assert!(Slug::from_title("!!!").is_none());
        assert!(Slug::from_title("").is_none());
    }

    #[test]
    fn test_from_title_truncates() {
        let slug = Slug::from_title(&"word ".repeat(30)).unwrap();
        assert!(slug.as_str().len() <= Slug::MAX_LEN);
        assert!(!slug.as_str().ends_with('-'));
    }
}
