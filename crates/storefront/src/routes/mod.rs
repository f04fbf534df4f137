//! HTTP route handlers for the store API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Liveness
//! GET  /health/ready                             - Readiness (database ping)
//! GET  /media/*                                  - Uploaded images
//!
//! # Catalog
//! GET    /store/products                         - List (page, search, unit_price__gt/lt, ordering)
//! POST   /store/products                         - Create (staff)
//! GET    /store/products/{id}                    - Retrieve
//! PUT    /store/products/{id}                    - Update (staff)
//! DELETE /store/products/{id}                    - Delete (staff, 409 if ordered)
//! GET    /store/products/{id}/images             - List images
//! POST   /store/products/{id}/images             - Upload image (staff, multipart)
//! GET    /store/products/{id}/images/{image_id}  - Retrieve image
//! DELETE /store/products/{id}/images/{image_id}  - Delete image (staff)
//! GET    /store/products/{id}/reviews            - List reviews
//! POST   /store/products/{id}/reviews            - Create review
//! GET    /store/products/{id}/reviews/{review_id}
//! PUT    /store/products/{id}/reviews/{review_id}
//! DELETE /store/products/{id}/reviews/{review_id}
//! GET    /store/products/{id}/promotions         - Attached promotions
//! POST   /store/products/{id}/promotions         - Attach (staff)
//! DELETE /store/products/{id}/promotions/{promotion_id} - Detach (staff)
//! GET    /store/collections                      - List
//! POST   /store/collections                      - Create (staff)
//! GET    /store/collections/{id}                 - Retrieve
//! PUT    /store/collections/{id}                 - Update (staff)
//! DELETE /store/collections/{id}                 - Delete (staff)
//! GET    /store/promotions                       - List
//! POST   /store/promotions                       - Create (staff)
//!
//! # Carts (anonymous)
//! POST   /store/carts                            - Create (rate limited)
//! GET    /store/carts/{id}                       - Retrieve with live total
//! DELETE /store/carts/{id}                       - Delete
//! GET    /store/carts/{id}/items                 - List items
//! POST   /store/carts/{id}/items                 - Add item (merges quantities)
//! GET    /store/carts/{id}/items/{item_id}       - Retrieve item
//! PATCH  /store/carts/{id}/items/{item_id}       - Set quantity
//! DELETE /store/carts/{id}/items/{item_id}       - Remove item
//!
//! # Customers
//! GET    /store/customers                        - List (staff)
//! POST   /store/customers                        - Create (staff)
//! GET    /store/customers/me                     - Own profile
//! PUT    /store/customers/me                     - Update own profile
//! GET    /store/customers/me/addresses           - Own addresses
//! POST   /store/customers/me/addresses           - Add address
//! GET    /store/customers/{id}                   - Retrieve (staff)
//! PUT    /store/customers/{id}                   - Update (staff)
//! DELETE /store/customers/{id}                   - Delete (staff, 409 with orders/addresses)
//!
//! # Orders (authenticated)
//! GET    /store/orders                           - Own orders (staff: all)
//! POST   /store/orders                           - Checkout a cart (rate limited)
//! GET    /store/orders/{id}                      - Retrieve (owner or staff)
//! PATCH  /store/orders/{id}                      - Set payment status (staff)
//! DELETE /store/orders/{id}                      - Delete (staff, 409 with items)
//!
//! # Tags
//! GET    /tags/{label}/items                     - Attachments with resolved targets
//! POST   /tags/{label}/items                     - Attach (staff)
//! DELETE /tags/{label}/items/{item_id}           - Detach (staff)
//! ```

pub mod carts;
pub mod collections;
pub mod customers;
pub mod images;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod reviews;
pub mod tags;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{MethodRouter, get, post},
};
use serde::Serialize;

use crate::middleware::RateLimiterLayer;
use crate::state::AppState;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total matches across all pages.
    pub count: i64,
    /// Next page number, if any.
    pub next: Option<u32>,
    /// Previous page number, if any.
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap the results of 1-based page `page` of size `page_size`.
    #[must_use]
    pub fn new(results: Vec<T>, count: i64, page: u32, page_size: u32) -> Self {
        let seen = i64::from(page) * i64::from(page_size);
        Self {
            count,
            next: (seen < count).then(|| page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        }
    }
}

/// Apply the optional limiter to a single method route.
fn limited(route: MethodRouter<AppState>, limiter: Option<RateLimiterLayer>) -> MethodRouter<AppState> {
    match limiter {
        Some(layer) => route.layer(layer),
        None => route,
    }
}

/// Create the product routes router, including nested images, reviews and
/// promotion links.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{product_id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        // Upload size is enforced while streaming in `images::upload`
        .route(
            "/{product_id}/images",
            get(images::index)
                .post(images::upload)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/{product_id}/images/{image_id}",
            get(images::show).delete(images::delete),
        )
        .route(
            "/{product_id}/reviews",
            get(reviews::index).post(reviews::create),
        )
        .route(
            "/{product_id}/reviews/{review_id}",
            get(reviews::show)
                .put(reviews::update)
                .delete(reviews::delete),
        )
        .route(
            "/{product_id}/promotions",
            get(promotions::for_product).post(promotions::attach),
        )
        .route(
            "/{product_id}/promotions/{promotion_id}",
            axum::routing::delete(promotions::detach),
        )
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index).post(collections::create))
        .route(
            "/{collection_id}",
            get(collections::show)
                .put(collections::update)
                .delete(collections::delete),
        )
}

/// Create the promotion routes router.
pub fn promotion_routes() -> Router<AppState> {
    Router::new().route("/", get(promotions::index).post(promotions::create))
}

/// Create the cart routes router.
pub fn cart_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route("/", limited(post(carts::create), limiter))
        .route("/{cart_id}", get(carts::show).delete(carts::delete))
        .route(
            "/{cart_id}/items",
            get(carts::items).post(carts::add_item),
        )
        .route(
            "/{cart_id}/items/{item_id}",
            get(carts::item)
                .patch(carts::update_item)
                .delete(carts::remove_item),
        )
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index).post(customers::create))
        .route("/me", get(customers::me).put(customers::update_me))
        .route(
            "/me/addresses",
            get(customers::addresses).post(customers::add_address),
        )
        .route(
            "/{customer_id}",
            get(customers::show)
                .put(customers::update)
                .delete(customers::delete),
        )
}

/// Create the order routes router.
pub fn order_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(orders::index).merge(limited(post(orders::create), limiter)),
        )
        .route(
            "/{order_id}",
            get(orders::show)
                .patch(orders::update)
                .delete(orders::delete),
        )
}

/// Create the tag routes router.
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/{label}/items", get(tags::items).post(tags::attach))
        .route("/{label}/items/{item_id}", axum::routing::delete(tags::detach))
}

/// Create all API routes.
///
/// `limiter` guards cart creation and checkout; pass `None` to disable.
pub fn routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .nest("/store/products", product_routes())
        .nest("/store/collections", collection_routes())
        .nest("/store/promotions", promotion_routes())
        .nest("/store/carts", cart_routes(limiter.clone()))
        .nest("/store/customers", customer_routes())
        .nest("/store/orders", order_routes(limiter))
        .nest("/tags", tag_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_of_many() {
        let page = Page::new(vec![1, 2], 5, 1, 2);
        assert_eq!(page.next, Some(2));
        assert_eq!(page.previous, None);
    }

    #[test]
    fn test_last_page() {
        let page = Page::new(vec![5], 5, 3, 2);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }

    #[test]
    fn test_exact_fit_has_no_next() {
        let page: Page<i32> = Page::new(vec![1, 2], 2, 1, 2);
        assert_eq!(page.next, None);
        assert_eq!(page.count, 2);
    }
}
