//! Integration tests for who can read tag attachments.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.

use aladabuy_core::{ContentType, TaggedRef};
use aladabuy_integration_tests::TestContext;
use aladabuy_storefront::models::{Customer, Order};
use aladabuy_storefront::services::{
    CheckoutService, EventBus, ResolvedItem, TaggingService, TargetRegistry, Viewer,
};

/// A product, a customer and one of their orders, all tagged with a fresh label.
async fn tagged(ctx: &TestContext, registry: &TargetRegistry) -> (String, Customer, Order) {
    let customer = ctx.customer().await;
    let product = ctx.product("3.00").await;
    let cart = ctx.cart_with(&[(product.id, 1)]).await;
    let events = EventBus::new();
    let order = CheckoutService::new(&ctx.pool, &events)
        .place_order(cart, customer.user_id)
        .await
        .expect("checkout succeeds");

    let label = format!("vip-{}", customer.id);
    let tags = TaggingService::new(&ctx.pool, registry);
    for target in [
        TaggedRef::new(ContentType::Product, product.id.as_i32()),
        TaggedRef::new(ContentType::Customer, customer.id.as_i32()),
        TaggedRef::new(ContentType::Order, order.id.as_i32()),
    ] {
        tags.attach(&label, target).await.expect("attach succeeds");
    }
    (label, customer, order)
}

fn item_of(items: &[ResolvedItem], content_type: ContentType) -> Option<&ResolvedItem> {
    items.iter().find(|i| i.item.content_type == content_type)
}

async fn visible(
    ctx: &TestContext,
    registry: &TargetRegistry,
    label: &str,
    viewer: Viewer,
) -> Vec<ResolvedItem> {
    TaggingService::new(&ctx.pool, registry)
        .items(label, viewer)
        .await
        .expect("list items")
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_anonymous_listing_hides_customers_and_orders() {
    let ctx = TestContext::new().await;
    let registry = TargetRegistry::with_defaults();
    let (label, _, _) = tagged(&ctx, &registry).await;

    let items = visible(&ctx, &registry, &label, Viewer::Anonymous).await;
    assert_eq!(items.len(), 3, "attachments stay listed");
    let product = item_of(&items, ContentType::Product).expect("product item");
    assert!(product.object.is_some());
    for hidden in [ContentType::Customer, ContentType::Order] {
        let item = item_of(&items, hidden).expect("hidden item is listed");
        assert_eq!(item.object, None, "{hidden}");
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_staff_listing_resolves_everything() {
    let ctx = TestContext::new().await;
    let registry = TargetRegistry::with_defaults();
    let (label, _, _) = tagged(&ctx, &registry).await;

    let items = visible(&ctx, &registry, &label, Viewer::Staff).await;
    assert!(items.iter().all(|i| i.object.is_some()));
    let customer = item_of(&items, ContentType::Customer)
        .and_then(|i| i.object.as_ref())
        .expect("customer object");
    assert_eq!(
        customer.get("phone").and_then(|v| v.as_str()),
        Some("555-0100")
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn test_customer_sees_own_order_only() {
    let ctx = TestContext::new().await;
    let registry = TargetRegistry::with_defaults();
    let (label, owner, _) = tagged(&ctx, &registry).await;
    let stranger = ctx.customer().await;

    let mine = visible(&ctx, &registry, &label, Viewer::Customer(owner.id)).await;
    let order = item_of(&mine, ContentType::Order).expect("order item");
    assert!(order.object.is_some());
    let profile = item_of(&mine, ContentType::Customer).expect("customer item");
    assert_eq!(profile.object, None);

    let theirs = visible(&ctx, &registry, &label, Viewer::Customer(stranger.id)).await;
    let order = item_of(&theirs, ContentType::Order).expect("order item");
    assert_eq!(order.object, None);
}
