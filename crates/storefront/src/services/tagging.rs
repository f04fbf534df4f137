//! Resolving tag attachments back to the objects they point at.
//!
//! Attachments only store `(content_type, object_id)`. The [`TargetRegistry`]
//! maps each content type to a lookup function.
//!
//! Catalog targets (products, collections, reviews) resolve for anyone.
//! Customers resolve for staff only, orders for staff and the ordering
//! customer. Everyone else sees the attachment with a `null` object.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use aladabuy_core::{
    CollectionId, ContentType, CustomerId, OrderId, ProductId, ReviewId, TagItemId, TaggedRef,
};

use crate::db::{
    CollectionRepository, CustomerRepository, OrderRepository, ProductRepository,
    RepositoryError, ReviewRepository, TagRepository,
};
use crate::models::TagItem;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Looks up one object by ID and renders it as JSON, or `None` if it is gone.
pub type Resolver =
    for<'a> fn(&'a PgPool, i32) -> BoxFuture<'a, Result<Option<Value>, RepositoryError>>;

/// Errors from tag operations.
#[derive(Debug, Error)]
pub enum TaggingError {
    /// No resolver is registered for the content type.
    #[error("content type {0} cannot be tagged")]
    Unregistered(ContentType),

    /// The target object does not exist.
    #[error("no object found for {0}")]
    TargetNotFound(TaggedRef),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn to_json<T: Serialize>(row: Option<T>) -> Result<Option<Value>, RepositoryError> {
    row.map(serde_json::to_value)
        .transpose()
        .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
}

fn resolve_product(pool: &PgPool, id: i32) -> BoxFuture<'_, Result<Option<Value>, RepositoryError>> {
    Box::pin(async move { to_json(ProductRepository::new(pool).get(ProductId::new(id)).await?) })
}

fn resolve_collection(
    pool: &PgPool,
    id: i32,
) -> BoxFuture<'_, Result<Option<Value>, RepositoryError>> {
    Box::pin(async move {
        to_json(
            CollectionRepository::new(pool)
                .get(CollectionId::new(id))
                .await?,
        )
    })
}

fn resolve_customer(pool: &PgPool, id: i32) -> BoxFuture<'_, Result<Option<Value>, RepositoryError>> {
    Box::pin(async move { to_json(CustomerRepository::new(pool).get(CustomerId::new(id)).await?) })
}

fn resolve_order(pool: &PgPool, id: i32) -> BoxFuture<'_, Result<Option<Value>, RepositoryError>> {
    Box::pin(async move { to_json(OrderRepository::new(pool).get(OrderId::new(id)).await?) })
}

fn resolve_review(pool: &PgPool, id: i32) -> BoxFuture<'_, Result<Option<Value>, RepositoryError>> {
    Box::pin(async move { to_json(ReviewRepository::new(pool).get(ReviewId::new(id)).await?) })
}

/// Content type → resolver table.
#[derive(Clone, Default)]
pub struct TargetRegistry {
    resolvers: HashMap<ContentType, Resolver>,
}

impl TargetRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with resolvers for every store entity.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ContentType::Product, resolve_product);
        registry.register(ContentType::Collection, resolve_collection);
        registry.register(ContentType::Customer, resolve_customer);
        registry.register(ContentType::Order, resolve_order);
        registry.register(ContentType::Review, resolve_review);
        registry
    }

    /// Register (or replace) the resolver for a content type.
    pub fn register(&mut self, content_type: ContentType, resolver: Resolver) {
        self.resolvers.insert(content_type, resolver);
    }

    #[must_use]
    pub fn supports(&self, content_type: ContentType) -> bool {
        self.resolvers.contains_key(&content_type)
    }

    /// Load the object an attachment points at.
    ///
    /// # Errors
    ///
    /// Returns `TaggingError::Unregistered` if the content type has no
    /// resolver, or `TaggingError::Repository` if the lookup fails.
    pub async fn resolve(
        &self,
        pool: &PgPool,
        target: TaggedRef,
    ) -> Result<Option<Value>, TaggingError> {
        let resolver = self
            .resolvers
            .get(&target.content_type)
            .ok_or(TaggingError::Unregistered(target.content_type))?;
        Ok(resolver(pool, target.object_id).await?)
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.resolvers.keys().collect();
        kinds.sort();
        f.debug_struct("TargetRegistry")
            .field("content_types", &kinds)
            .finish()
    }
}

/// Who is listing a tag's attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Not signed in, or signed in without a customer profile.
    Anonymous,
    Customer(CustomerId),
    Staff,
}

/// How much of a target a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Full,
    IfOrderedBy(CustomerId),
    Hidden,
}

const fn access(viewer: Viewer, content_type: ContentType) -> Access {
    match (content_type, viewer) {
        (ContentType::Product | ContentType::Collection | ContentType::Review, _)
        | (_, Viewer::Staff) => Access::Full,
        (ContentType::Order, Viewer::Customer(me)) => Access::IfOrderedBy(me),
        _ => Access::Hidden,
    }
}

/// An attachment together with its resolved target.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedItem {
    pub item: TagItem,
    /// `None` when the target has since been deleted or is hidden from the
    /// viewer.
    pub object: Option<Value>,
}

/// Tag operations that need the registry.
pub struct TaggingService<'a> {
    pool: &'a PgPool,
    registry: &'a TargetRegistry,
}

impl<'a> TaggingService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, registry: &'a TargetRegistry) -> Self {
        Self { pool, registry }
    }

    /// Every attachment of `label`, each with its target object as far as
    /// `viewer` may see it.
    ///
    /// # Errors
    ///
    /// Returns `TaggingError` if a lookup fails.
    #[instrument(skip(self))]
    pub async fn items(
        &self,
        label: &str,
        viewer: Viewer,
    ) -> Result<Vec<ResolvedItem>, TaggingError> {
        let items = TagRepository::new(self.pool).items(label).await?;
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            let object = match access(viewer, item.content_type) {
                Access::Full => self.lookup(&item).await?,
                Access::IfOrderedBy(me) => {
                    let owned = OrderRepository::new(self.pool)
                        .get(OrderId::new(item.object_id))
                        .await?
                        .is_some_and(|order| order.customer_id == me);
                    if owned { self.lookup(&item).await? } else { None }
                }
                Access::Hidden => None,
            };
            resolved.push(ResolvedItem { item, object });
        }
        Ok(resolved)
    }

    async fn lookup(&self, item: &TagItem) -> Result<Option<Value>, TaggingError> {
        match self.registry.resolve(self.pool, item.target()).await {
            Err(TaggingError::Unregistered(content_type)) => {
                tracing::warn!(%content_type, item_id = %item.id, "No resolver for tagged item");
                Ok(None)
            }
            other => other,
        }
    }

    /// Attach `label` to an existing object.
    ///
    /// # Errors
    ///
    /// Returns `TaggingError::TargetNotFound` if the object does not exist.
    #[instrument(skip(self, target), fields(tagged = %target))]
    pub async fn attach(&self, label: &str, target: TaggedRef) -> Result<ResolvedItem, TaggingError> {
        let object = self
            .registry
            .resolve(self.pool, target)
            .await?
            .ok_or(TaggingError::TargetNotFound(target))?;
        let item = TagRepository::new(self.pool).attach(label, target).await?;
        tracing::info!(label, item_id = %item.id, "Tag attached");
        Ok(ResolvedItem {
            item,
            object: Some(object),
        })
    }

    /// Remove one attachment of `label`.
    ///
    /// # Errors
    ///
    /// Returns `TaggingError::Repository(NotFound)` if it does not exist.
    pub async fn detach(&self, label: &str, item: TagItemId) -> Result<(), TaggingError> {
        TagRepository::new(self.pool).detach(label, item).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/aladabuy_unused")
            .unwrap()
    }

    fn echo(_pool: &PgPool, id: i32) -> BoxFuture<'_, Result<Option<Value>, RepositoryError>> {
        Box::pin(async move { Ok((id > 0).then(|| json!({ "id": id }))) })
    }

    #[test]
    fn test_defaults_cover_every_content_type() {
        let registry = TargetRegistry::with_defaults();
        for content_type in ContentType::ALL {
            assert!(registry.supports(content_type), "{content_type}");
        }
    }

    #[tokio::test]
    async fn test_resolve_dispatches_on_content_type() {
        let mut registry = TargetRegistry::new();
        registry.register(ContentType::Review, echo);
        let pool = lazy_pool();

        let found = registry
            .resolve(&pool, TaggedRef::new(ContentType::Review, 4))
            .await
            .unwrap();
        assert_eq!(found, Some(json!({ "id": 4 })));

        let gone = registry
            .resolve(&pool, TaggedRef::new(ContentType::Review, 0))
            .await
            .unwrap();
        assert_eq!(gone, None);
    }

    #[tokio::test]
    async fn test_unregistered_content_type_is_an_error() {
        let registry = TargetRegistry::new();
        let err = registry
            .resolve(&lazy_pool(), TaggedRef::new(ContentType::Order, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TaggingError::Unregistered(ContentType::Order)));
    }

    #[test]
    fn test_catalog_targets_are_public() {
        let me = CustomerId::new(3);
        for viewer in [Viewer::Anonymous, Viewer::Customer(me), Viewer::Staff] {
            for content_type in [ContentType::Product, ContentType::Collection, ContentType::Review] {
                assert_eq!(access(viewer, content_type), Access::Full, "{content_type}");
            }
        }
    }

    #[test]
    fn test_customers_resolve_for_staff_only() {
        assert_eq!(access(Viewer::Anonymous, ContentType::Customer), Access::Hidden);
        assert_eq!(
            access(Viewer::Customer(CustomerId::new(3)), ContentType::Customer),
            Access::Hidden
        );
        assert_eq!(access(Viewer::Staff, ContentType::Customer), Access::Full);
    }

    #[test]
    fn test_orders_resolve_for_staff_and_owner() {
        let me = CustomerId::new(3);
        assert_eq!(access(Viewer::Anonymous, ContentType::Order), Access::Hidden);
        assert_eq!(access(Viewer::Customer(me), ContentType::Order), Access::IfOrderedBy(me));
        assert_eq!(access(Viewer::Staff, ContentType::Order), Access::Full);
    }

    #[test]
    fn test_to_json_keeps_absence() {
        assert_eq!(to_json::<i32>(None).unwrap(), None);
        assert_eq!(to_json(Some(3)).unwrap(), Some(json!(3)));
    }
}
