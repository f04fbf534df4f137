//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{CustomerNotifier, EventBus, TargetRegistry};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    events: EventBus,
    targets: TargetRegistry,
}

impl AppState {
    /// Create application state with the default listeners and tag targets.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let mut events = EventBus::new();
        events.subscribe(Arc::new(CustomerNotifier));
        Self::with_services(config, pool, events, TargetRegistry::with_defaults())
    }

    /// Create application state with explicit services.
    #[must_use]
    pub fn with_services(
        config: StorefrontConfig,
        pool: PgPool,
        events: EventBus,
        targets: TargetRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                events,
                targets,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Listeners notified after each checkout.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Resolvers for tag targets.
    #[must_use]
    pub fn targets(&self) -> &TargetRegistry {
        &self.inner.targets
    }
}
