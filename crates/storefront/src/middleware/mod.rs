//! HTTP middleware and extractors for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting on cart creation and checkout (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthRejection, CurrentUser, OptionalUser, RequireStaff, RequireUser, is_staff};
pub use rate_limit::{RateLimiterLayer, write_rate_limiter};
pub use request_id::request_id_middleware;
