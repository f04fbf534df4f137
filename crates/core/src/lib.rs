//! Aladabuy Core - Shared domain types and rules.
//!
//! This crate provides the types used across all Aladabuy components:
//! - `storefront` - The public store API (catalog, carts, checkout)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types, validation and pure calculations - no
//! I/O, no database access, no HTTP. Everything that decides *what* a valid
//! price, quantity or order line is lives here; the storefront decides *where*
//! it is stored.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, slugs and statuses
//! - [`cart`] - Cart line math (line totals, live cart total)
//! - [`checkout`] - Freezing cart lines into order lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{CartLine, cart_total};
pub use checkout::{CheckoutRejection, OrderLine, freeze_lines};
pub use types::*;
