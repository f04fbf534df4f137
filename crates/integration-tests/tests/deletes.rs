//! Integration tests for protected deletes.
//!
//! Products referenced by order items, customers with orders and orders
//! with items cannot be deleted.

use aladabuy_core::{ContentType, TaggedRef};
use aladabuy_integration_tests::TestContext;
use aladabuy_storefront::db::{
    CustomerRepository, OrderRepository, ProductRepository, RepositoryError, TagRepository,
};
use aladabuy_storefront::models::{Order, Product};
use aladabuy_storefront::services::{CheckoutService, EventBus};

async fn placed_order(ctx: &TestContext) -> (Order, Product) {
    let customer = ctx.customer().await;
    let product = ctx.product("7.00").await;
    let cart = ctx.cart_with(&[(product.id, 1)]).await;
    let events = EventBus::new();
    let order = CheckoutService::new(&ctx.pool, &events)
        .place_order(cart, customer.user_id)
        .await
        .expect("checkout succeeds");
    (order, product)
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_ordered_product_is_protected() {
    let ctx = TestContext::new().await;
    let (_, product) = placed_order(&ctx).await;

    let err = ProductRepository::new(&ctx.pool)
        .delete(product.id)
        .await
        .expect_err("product is referenced by an order item");
    assert!(matches!(err, RepositoryError::Protected(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_customer_with_orders_is_protected() {
    let ctx = TestContext::new().await;
    let (order, _) = placed_order(&ctx).await;

    let err = CustomerRepository::new(&ctx.pool)
        .delete(order.customer_id)
        .await
        .expect_err("customer has an order");
    assert!(matches!(err, RepositoryError::Protected(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_order_with_items_is_protected() {
    let ctx = TestContext::new().await;
    let (order, _) = placed_order(&ctx).await;

    let err = OrderRepository::new(&ctx.pool)
        .delete(order.id)
        .await
        .expect_err("order has items");
    assert!(matches!(err, RepositoryError::Protected(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_unordered_product_can_be_deleted() {
    let ctx = TestContext::new().await;
    let product = ctx.product("1.00").await;
    let cart = ctx.cart_with(&[(product.id, 2)]).await;
    let products = ProductRepository::new(&ctx.pool);

    products.delete(product.id).await.expect("delete succeeds");
    assert!(products.get(product.id).await.expect("lookup").is_none());
    assert!(ctx.cart_exists(cart).await, "carts outlive their products");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_tags_survive_target_deletion() {
    let ctx = TestContext::new().await;
    let product = ctx.product("1.00").await;
    let label = format!("clearance-{}", product.id);
    let tags = TagRepository::new(&ctx.pool);

    tags.attach(&label, TaggedRef::new(ContentType::Product, product.id.as_i32()))
        .await
        .expect("attach succeeds");
    ProductRepository::new(&ctx.pool)
        .delete(product.id)
        .await
        .expect("delete succeeds");

    let items = tags.items(&label).await.expect("list items");
    assert_eq!(items.len(), 1);
}
