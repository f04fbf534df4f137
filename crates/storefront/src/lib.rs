//! Aladabuy storefront library.
//!
//! The store's JSON API: catalog, anonymous carts, checkout, customers and
//! tags, served by axum over `PostgreSQL`. The binary in `main.rs` only
//! loads configuration, sets up tracing and calls [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use middleware::{RateLimiterLayer, request_id_middleware};
use routes::products::MEDIA_URL;
use state::AppState;

/// Build the application router.
///
/// `limiter` guards cart creation and checkout; tests pass `None`.
pub fn app(state: AppState, limiter: Option<RateLimiterLayer>) -> Router {
    let media = ServeDir::new(&state.config().media_root);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(limiter))
        .nest_service(MEDIA_URL, media)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::middleware::auth::{STAFF_HEADER, USER_ID_HEADER};

    fn test_app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/aladabuy_unused"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            media_root: std::env::temp_dir().join("aladabuy-test-media"),
            max_image_kb: 500,
            page_size: 10,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/aladabuy_unused")
            .unwrap();
        app(AppState::new(config, pool), None)
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn json_request(method: Method, uri: &str, user: Option<(&str, bool)>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some((id, staff)) = user {
            builder = builder
                .header(USER_ID_HEADER, id)
                .header(STAFF_HEADER, if staff { "true" } else { "false" });
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_checkout_requires_authentication() {
        let (status, body) = send(json_request(
            Method::POST,
            "/store/orders",
            None,
            r#"{"cart_id":"00000000-0000-0000-0000-000000000000"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Authentication credentials were not provided.");
    }

    #[tokio::test]
    async fn test_checkout_rejects_malformed_cart_id() {
        let (status, body) = send(json_request(
            Method::POST,
            "/store/orders",
            Some(("7", false)),
            r#"{"cart_id":"not-a-cart"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["cart_id"][0], "No cart with the given id found.");
    }

    #[tokio::test]
    async fn test_product_create_requires_staff() {
        let (status, body) = send(json_request(
            Method::POST,
            "/store/products",
            Some(("7", false)),
            r#"{"title":"Rye","unit_price":"4.50","inventory":3}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "You do not have permission to perform this action.");
    }

    #[tokio::test]
    async fn test_product_create_validates_fields() {
        let (status, body) = send(json_request(
            Method::POST,
            "/store/products",
            Some(("1", true)),
            r#"{"title":"","unit_price":"0.50","inventory":0}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("title").is_some());
        assert!(body.get("unit_price").is_some());
        assert!(body.get("inventory").is_some());
    }

    #[tokio::test]
    async fn test_product_list_rejects_bad_filters() {
        let (status, body) = send(
            Request::get("/store/products?unit_price__gt=cheap&ordering=random")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("unit_price__gt").is_some());
        assert!(body.get("ordering").is_some());
    }

    #[tokio::test]
    async fn test_add_item_rejects_zero_quantity() {
        let (status, body) = send(json_request(
            Method::POST,
            "/store/carts/00000000-0000-0000-0000-000000000000/items",
            None,
            r#"{"product_id":1,"quantity":0}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["quantity"][0],
            "Ensure this value is greater than or equal to 1."
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request() {
        let (status, body) = send(json_request(
            Method::PATCH,
            "/store/carts/00000000-0000-0000-0000-000000000000/items/1",
            None,
            "{not json",
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_customer_list_requires_staff() {
        let (status, _) = send(json_request(Method::GET, "/store/customers", Some(("3", false)), "")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_tag_attach_rejects_unknown_content_type() {
        let (status, body) = send(json_request(
            Method::POST,
            "/tags/featured/items",
            Some(("1", true)),
            r#"{"content_type":"auth.user","object_id":1}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("content_type").is_some());
    }
}
