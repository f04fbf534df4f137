//! Customer notifications.
//!
//! The notifier only logs for now; delivery (e-mail, SMS) plugs in here.

use tracing::info;

use super::events::{ListenerError, OrderCreated, OrderListener};

/// Tells the customer their order was received.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerNotifier;

impl OrderListener for CustomerNotifier {
    fn name(&self) -> &'static str {
        "customer_notifier"
    }

    fn handle(&self, event: &OrderCreated) -> Result<(), ListenerError> {
        info!(
            order_id = %event.order_id,
            customer_id = %event.customer_id,
            item_count = event.item_count,
            "Order confirmation queued"
        );
        Ok(())
    }
}
