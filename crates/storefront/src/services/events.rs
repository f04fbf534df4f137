//! In-process "order created" event dispatch.
//!
//! Listeners are called one after another once the checkout transaction has
//! committed. A listener that returns an error or panics is logged and
//! skipped; the remaining listeners still run and the publisher never sees
//! the failure.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use aladabuy_core::{CustomerId, OrderId};

use crate::models::Order;

/// Payload published after an order has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub item_count: usize,
}

impl OrderCreated {
    #[must_use]
    pub const fn new(order: &Order, item_count: usize) -> Self {
        Self {
            order_id: order.id,
            customer_id: order.customer_id,
            placed_at: order.placed_at,
            item_count,
        }
    }
}

/// Error a listener reports back to the bus.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

/// Receiver of order-created events.
///
/// Handlers run on the request task after the response data is ready, so
/// anything slow belongs on a spawned task.
pub trait OrderListener: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Any error is logged by the bus and otherwise ignored.
    fn handle(&self, event: &OrderCreated) -> Result<(), ListenerError>;
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered set of order-created listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn OrderListener>>,
}

impl EventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn subscribe(&mut self, listener: Arc<dyn OrderListener>) {
        info!(listener.name = listener.name(), "Registered order listener");
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener, isolating failures.
    pub fn send_robust(&self, event: &OrderCreated) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for listener in &self.listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.handle(event))) {
                Ok(Ok(())) => summary.delivered += 1,
                Ok(Err(e)) => {
                    summary.failed += 1;
                    error!(
                        listener.name = listener.name(),
                        order_id = %event.order_id,
                        error = %e,
                        "Order listener failed"
                    );
                }
                Err(_) => {
                    summary.failed += 1;
                    error!(
                        listener.name = listener.name(),
                        order_id = %event.order_id,
                        "Order listener panicked"
                    );
                }
            }
        }

        summary
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "listeners",
                &self.listeners.iter().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
