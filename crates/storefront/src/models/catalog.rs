//! Catalog rows: products, collections, promotions, images and reviews.

use chrono::NaiveDate;
use serde::Serialize;

use aladabuy_core::{
    CollectionId, ProductId, ProductImageId, PromotionId, ReviewId, Slug, UnitPrice,
};

/// A product for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub unit_price: UnitPrice,
    pub inventory: i32,
    pub last_update: NaiveDate,
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub title: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub unit_price: UnitPrice,
    pub inventory: i32,
}

/// A named group of products with an optional featured product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    #[serde(rename = "featured_product")]
    pub featured_product_id: Option<ProductId>,
}

/// A discount that can be attached to any number of products.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Promotion {
    pub id: PromotionId,
    pub description: String,
    pub discount: f64,
}

/// An uploaded product image. `image` is relative to the media root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub image: String,
}

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
}
