//! Request body extractors.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that is deserialized and then checked with [`Validate`].
///
/// Malformed JSON is a `400` with a `detail` message; failed validation is a
/// `400` with per-field messages.
///
/// # Example
///
/// ```rust,ignore
/// async fn create(ValidJson(body): ValidJson<CreateReview>) -> Result<Json<Review>> {
///     // body has passed validation
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct AddItem {
        #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
        quantity: i64,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidJson(body) =
            ValidJson::<AddItem>::from_request(json_request(r#"{"quantity": 2}"#), &())
                .await
                .unwrap();
        assert_eq!(body.quantity, 2);
    }

    #[tokio::test]
    async fn test_invalid_field_is_reported_by_name() {
        let err = ValidJson::<AddItem>::from_request(json_request(r#"{"quantity": 0}"#), &())
            .await
            .unwrap_err();
        let AppError::Validation(fields) = err else {
            unreachable!("expected a validation error");
        };
        assert_eq!(
            fields["quantity"],
            vec!["Ensure this value is greater than or equal to 1."]
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = ValidJson::<AddItem>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
