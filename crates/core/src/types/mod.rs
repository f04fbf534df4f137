//! Core types for Aladabuy.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod quantity;
pub mod slug;
pub mod status;
pub mod tag;

pub use id::*;
pub use price::{PriceError, TAX_RATE, UnitPrice};
pub use quantity::{Quantity, QuantityError};
pub use slug::{Slug, SlugError};
pub use status::*;
pub use tag::{ContentType, ContentTypeError, TaggedRef};
