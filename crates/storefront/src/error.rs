//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Client errors are rendered as JSON: field-level validation failures as
//! `{"field": ["message", ...]}`, everything else as `{"detail": "message"}`.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::checkout::CheckoutError;
use crate::services::tagging::TaggingError;

/// Validation messages keyed by the offending field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more fields failed validation.
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Delete blocked because protected records still reference the row.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Duplicate of an existing unique record.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A validation error on a single field.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    /// The standard 404 for a missing object.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound("Not found.".to_string())
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Integrity(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        match self {
            Self::Validation(errors) => (status, Json(errors)).into_response(),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => (
                status,
                Json(json!({ "detail": "A server error occurred." })),
            )
                .into_response(),
            Self::BadRequest(detail)
            | Self::NotFound(detail)
            | Self::Unauthorized(detail)
            | Self::Forbidden(detail)
            | Self::Integrity(detail)
            | Self::Conflict(detail) => (status, Json(json!({ "detail": detail }))).into_response(),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::not_found(),
            RepositoryError::Conflict(constraint) => {
                tracing::debug!(%constraint, "unique constraint violated");
                Self::Conflict("A record with these values already exists.".to_string())
            }
            RepositoryError::Protected(constraint) => {
                tracing::debug!(%constraint, "protected delete blocked");
                Self::Integrity(
                    "Cannot delete this record because other records reference it.".to_string(),
                )
            }
            RepositoryError::Invalid(reason) => Self::BadRequest(format!("Invalid value: {reason}.")),
            RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                Self::Database(err)
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| format!("Invalid value ({}).", e.code), ToString::to_string)
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        Self::Validation(fields)
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(rejection) => Self::field("cart_id", rejection.to_string()),
            CheckoutError::CustomerNotFound => {
                Self::NotFound("No customer profile for this user.".to_string())
            }
            CheckoutError::Repository(e) => e.into(),
        }
    }
}

impl From<TaggingError> for AppError {
    fn from(err: TaggingError) -> Self {
        match err {
            TaggingError::Unregistered(content_type) => {
                Self::field("content_type", format!("{content_type} cannot be tagged."))
            }
            TaggingError::TargetNotFound(target) => {
                Self::field("object_id", format!("No object found for {target}."))
            }
            TaggingError::Repository(e) => e.into(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order placed", Some(&[("order_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aladabuy_core::{CheckoutRejection, ContentType, TaggedRef};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::not_found()), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::field("quantity", "too small")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Integrity("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_statuses() {
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Protected("order_item_product_id_fkey".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::Invalid("product_inventory_check".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::Database(sqlx::Error::PoolTimedOut).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_checkout_rejection_is_a_cart_id_field_error() {
        let err: AppError = CheckoutError::Rejected(CheckoutRejection::CartEmpty).into();
        assert_eq!(
            body_json(err).await,
            json!({ "cart_id": ["The cart is empty."] })
        );
    }

    #[tokio::test]
    async fn test_missing_customer_is_not_found() {
        let err: AppError = CheckoutError::CustomerNotFound.into();
        assert_eq!(get_status(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let body = body_json(AppError::Internal("connection refused".to_string())).await;
        assert_eq!(body, json!({ "detail": "A server error occurred." }));
    }

    #[tokio::test]
    async fn test_missing_tag_target_names_the_target() {
        let err: AppError =
            TaggingError::TargetNotFound(TaggedRef::new(ContentType::Order, 12)).into();
        assert_eq!(
            body_json(err).await,
            json!({ "object_id": ["No object found for store.order#12."] })
        );
    }
}
