//! Business logic that spans more than one repository.
//!
//! # Services
//!
//! - `checkout` - Cart → order conversion in one transaction
//! - `events` - In-process "order created" dispatch with isolated listeners
//! - `notifications` - Default order listener
//! - `tagging` - Content-type registry for resolving tag targets

pub mod checkout;
pub mod events;
pub mod notifications;
pub mod tagging;

pub use checkout::{CheckoutError, CheckoutService};
pub use events::{DispatchSummary, EventBus, ListenerError, OrderCreated, OrderListener};
pub use notifications::CustomerNotifier;
pub use tagging::{ResolvedItem, TaggingError, TaggingService, TargetRegistry, Viewer};
