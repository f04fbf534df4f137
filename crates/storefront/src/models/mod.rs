//! Domain models for the store.
//!
//! Row types map one-to-one onto tables in the `store` and `tags` schemas and
//! carry the typed IDs and value types from `aladabuy-core`. The JSON shapes
//! clients see are built from these in `routes`.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod tag;

pub use cart::{Cart, CartItem, CartItemDetail};
pub use catalog::{Collection, Product, ProductImage, ProductInput, Promotion, Review};
pub use customer::{Address, Customer, CustomerInput};
pub use order::{Order, OrderItemDetail};
pub use tag::{Tag, TagItem};
