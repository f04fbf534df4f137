//! Identity extractors.
//!
//! Authentication happens upstream. The gateway in front of the storefront
//! verifies the caller and forwards two trusted headers:
//!
//! - `x-user-id` - the authenticated user's positive integer ID
//! - `x-user-is-staff` - `true` for store staff
//!
//! Requests without `x-user-id` are anonymous. A present but malformed header
//! is treated as unauthenticated rather than guessed at.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use aladabuy_core::UserId;

use crate::error::set_sentry_user;

/// Header carrying the authenticated user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header flagging staff users.
pub const STAFF_HEADER: &str = "x-user-is-staff";

/// The caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub is_staff: bool,
}

impl CurrentUser {
    /// Read the identity headers. `None` if absent or malformed.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let id = headers
            .get(USER_ID_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)?;

        let is_staff = headers
            .get(STAFF_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        Some(Self {
            id: UserId::new(id),
            is_staff,
        })
    }
}

/// Error returned when a handler's identity requirement is not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No (valid) identity headers.
    Unauthenticated,
    /// Authenticated, but not staff.
    NotStaff,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
            Self::NotStaff => (
                StatusCode::FORBIDDEN,
                "You do not have permission to perform this action.",
            ),
        };
        (status, axum::Json(json!({ "detail": detail }))).into_response()
    }
}

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireUser(user): RequireUser) -> String {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_headers(&parts.headers).ok_or(AuthRejection::Unauthenticated)?;
        set_sentry_user(&user.id);
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireUser`, this does not reject anonymous requests.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(CurrentUser::from_headers(&parts.headers)))
    }
}

/// Extractor that requires a staff user.
pub struct RequireStaff(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if user.is_staff {
            Ok(Self(user))
        } else {
            Err(AuthRejection::NotStaff)
        }
    }
}

/// Whether the caller is staff; anonymous callers are not.
#[must_use]
pub fn is_staff(user: Option<&CurrentUser>) -> bool {
    user.is_some_and(|u| u.is_staff)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, Request};

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn parts(pairs: &[(&'static str, &'static str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in pairs {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_from_headers() {
        let user = CurrentUser::from_headers(&headers(&[
            (USER_ID_HEADER, "42"),
            (STAFF_HEADER, "True"),
        ]))
        .unwrap();
        assert_eq!(user.id, UserId::new(42));
        assert!(user.is_staff);

        let user = CurrentUser::from_headers(&headers(&[(USER_ID_HEADER, "7")])).unwrap();
        assert!(!user.is_staff);
    }

    #[test]
    fn test_malformed_user_id_is_anonymous() {
        assert!(CurrentUser::from_headers(&headers(&[])).is_none());
        assert!(CurrentUser::from_headers(&headers(&[(USER_ID_HEADER, "abc")])).is_none());
        assert!(CurrentUser::from_headers(&headers(&[(USER_ID_HEADER, "0")])).is_none());
        assert!(CurrentUser::from_headers(&headers(&[(USER_ID_HEADER, "-3")])).is_none());
    }

    #[tokio::test]
    async fn test_require_user_rejects_anonymous() {
        let result = RequireUser::from_request_parts(&mut parts(&[]), &()).await;
        assert!(matches!(result, Err(AuthRejection::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_require_staff() {
        let result =
            RequireStaff::from_request_parts(&mut parts(&[(USER_ID_HEADER, "3")]), &()).await;
        assert!(matches!(result, Err(AuthRejection::NotStaff)));

        let result = RequireStaff::from_request_parts(
            &mut parts(&[(USER_ID_HEADER, "3"), (STAFF_HEADER, "true")]),
            &(),
        )
        .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AuthRejection::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::NotStaff.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_is_staff() {
        assert!(!is_staff(None));
        let staff = CurrentUser {
            id: UserId::new(1),
            is_staff: true,
        };
        assert!(is_staff(Some(&staff)));
    }
}
