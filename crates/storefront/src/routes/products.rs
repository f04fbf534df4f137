//! Product route handlers.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use aladabuy_core::{ProductId, ProductImageId, Slug, UnitPrice};

use super::Page;
use crate::db::{ImageRepository, ProductFilter, ProductRepository};
use crate::error::{AppError, FieldErrors, Result};
use crate::extract::ValidJson;
use crate::middleware::RequireStaff;
use crate::models::{Product, ProductImage, ProductInput};
use crate::state::AppState;
use crate::validation::{self, convert};

/// Public URL prefix for files under the media root.
pub const MEDIA_URL: &str = "/media";

/// Image as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub id: ProductImageId,
    /// URL the image is served from.
    pub image: String,
}

impl From<&ProductImage> for ImageView {
    fn from(image: &ProductImage) -> Self {
        Self {
            id: image.id,
            image: format!("{MEDIA_URL}/{}", image.image),
        }
    }
}

/// Product as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub inventory: i32,
    pub unit_price: UnitPrice,
    pub price_with_tax: Decimal,
    pub last_update: NaiveDate,
    pub images: Vec<ImageView>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: Product, images: &[ProductImage]) -> Self {
        Self {
            id: product.id,
            price_with_tax: product.unit_price.with_tax(),
            title: product.title,
            slug: product.slug,
            description: product.description,
            inventory: product.inventory,
            unit_price: product.unit_price,
            last_update: product.last_update,
            images: images.iter().map(ImageView::from).collect(),
        }
    }
}

/// Query parameters for the product list.
///
/// Numbers arrive as text so bad values become field errors rather than a
/// generic query rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "unit_price__gt")]
    pub unit_price_gt: Option<String>,
    #[serde(rename = "unit_price__lt")]
    pub unit_price_lt: Option<String>,
    pub ordering: Option<String>,
}

fn parse_field<T: std::str::FromStr>(
    name: &str,
    raw: Option<&str>,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    raw.parse().map_or_else(
        |_| {
            errors.insert(name.to_string(), vec![message.to_string()]);
            None
        },
        Some,
    )
}

impl ProductQuery {
    /// Split into a filter and a 1-based page number.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming every malformed parameter.
    pub fn parse(&self) -> Result<(ProductFilter, u32)> {
        let mut errors = FieldErrors::new();

        let unit_price_gt =
            parse_field("unit_price__gt", self.unit_price_gt.as_deref(), "Enter a number.", &mut errors);
        let unit_price_lt =
            parse_field("unit_price__lt", self.unit_price_lt.as_deref(), "Enter a number.", &mut errors);
        let ordering = parse_field(
            "ordering",
            self.ordering.as_deref(),
            "Select a valid ordering: title, unit_price, -unit_price, last_update, -last_update.",
            &mut errors,
        )
        .unwrap_or_default();
        let page = parse_field::<u32>("page", self.page.as_deref(), "Invalid page.", &mut errors)
            .unwrap_or(1);

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        if page == 0 {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok((
            ProductFilter {
                search,
                unit_price_gt,
                unit_price_lt,
                ordering,
            },
            page,
        ))
    }
}

/// Body for creating or replacing a product.
#[derive(Debug, Deserialize, Validate)]
pub struct ProductBody {
    #[validate(
        length(max = 255, message = "Ensure this field has no more than 255 characters."),
        custom(function = "validation::not_blank")
    )]
    pub title: String,
    /// Derived from the title when omitted.
    #[validate(custom(function = "validation::slug"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validation::unit_price"))]
    pub unit_price: Decimal,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub inventory: i32,
}

impl ProductBody {
    /// Convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns a field error on `slug` if none was given and the title has
    /// nothing to derive one from.
    pub fn into_input(self) -> Result<ProductInput> {
        let slug = match self.slug.as_deref() {
            Some(raw) => convert("slug", Slug::parse(raw))?,
            None => Slug::from_title(&self.title).ok_or_else(|| {
                AppError::field("slug", "Could not derive a slug from the title; provide one.")
            })?,
        };

        Ok(ProductInput {
            title: self.title.trim().to_string(),
            slug,
            description: self.description.filter(|d| !d.trim().is_empty()),
            unit_price: convert("unit_price", UnitPrice::new(self.unit_price))?,
            inventory: self.inventory,
        })
    }
}

/// Attach images to products in one query.
async fn with_images(state: &AppState, products: Vec<Product>) -> Result<Vec<ProductView>> {
    let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let mut images: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
    for image in ImageRepository::new(state.pool()).for_products(&ids).await? {
        images.entry(image.product_id).or_default().push(image);
    }

    Ok(products
        .into_iter()
        .map(|p| {
            let own = images.remove(&p.id).unwrap_or_default();
            ProductView::new(p, &own)
        })
        .collect())
}

/// List products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<ProductView>>> {
    let (filter, page) = query.parse()?;
    let page_size = state.config().page_size;
    let offset = i64::from(page - 1) * i64::from(page_size);

    let (products, count) = ProductRepository::new(state.pool())
        .list(&filter, i64::from(page_size), offset)
        .await?;
    if products.is_empty() && page > 1 {
        return Err(AppError::NotFound("Invalid page.".to_string()));
    }

    let results = with_images(&state, products).await?;
    Ok(Json(Page::new(results, count, page, page_size)))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    let images = ImageRepository::new(state.pool())
        .for_product(product_id)
        .await?;
    Ok(Json(ProductView::new(product, &images)))
}

/// Create a product.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidJson(body): ValidJson<ProductBody>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let input = body.into_input()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(ProductView::new(product, &[]))))
}

/// Replace a product's fields.
#[instrument(skip(state, body), fields(user_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(product_id): Path<ProductId>,
    ValidJson(body): ValidJson<ProductBody>,
) -> Result<Json<ProductView>> {
    let input = body.into_input()?;
    let product = ProductRepository::new(state.pool())
        .update(product_id, &input)
        .await?;
    let images = ImageRepository::new(state.pool())
        .for_product(product_id)
        .await?;
    Ok(Json(ProductView::new(product, &images)))
}

/// Delete a product. Fails with 409 while order items reference it.
#[instrument(skip(state), fields(user_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(product_id)
        .await?;
    tracing::info!(%product_id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::ProductOrdering;

    fn product() -> Product {
        Product {
            id: ProductId::new(1),
            title: "Sourdough".to_string(),
            slug: Slug::parse("sourdough").unwrap(),
            description: None,
            unit_price: UnitPrice::new(Decimal::new(1000, 2)).unwrap(),
            inventory: 5,
            last_update: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_view_derives_price_with_tax() {
        let view = ProductView::new(product(), &[]);
        assert_eq!(view.price_with_tax, Decimal::new(1100, 2));
    }

    #[test]
    fn test_view_image_urls() {
        let image = ProductImage {
            id: ProductImageId::new(3),
            product_id: ProductId::new(1),
            image: "store/images/abc-loaf.jpg".to_string(),
        };
        let view = ProductView::new(product(), &[image]);
        assert_eq!(view.images[0].image, "/media/store/images/abc-loaf.jpg");
    }

    #[test]
    fn test_query_parse() {
        let query = ProductQuery {
            page: Some("2".to_string()),
            search: Some("  loaf ".to_string()),
            unit_price_gt: Some("5".to_string()),
            unit_price_lt: None,
            ordering: Some("-unit_price".to_string()),
        };
        let (filter, page) = query.parse().unwrap();
        assert_eq!(page, 2);
        assert_eq!(filter.search.as_deref(), Some("loaf"));
        assert_eq!(filter.unit_price_gt, Some(Decimal::new(5, 0)));
        assert_eq!(filter.ordering, ProductOrdering::UnitPriceDesc);
    }

    #[test]
    fn test_query_reports_every_bad_field() {
        let query = ProductQuery {
            unit_price_gt: Some("cheap".to_string()),
            ordering: Some("random".to_string()),
            ..ProductQuery::default()
        };
        let AppError::Validation(errors) = query.parse().unwrap_err() else {
            unreachable!("expected a validation error");
        };
        assert!(errors.contains_key("unit_price__gt"));
        assert!(errors.contains_key("ordering"));
    }

    #[test]
    fn test_page_zero_is_not_found() {
        let query = ProductQuery {
            page: Some("0".to_string()),
            ..ProductQuery::default()
        };
        assert!(matches!(query.parse(), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_body_derives_slug_from_title() {
        let body = ProductBody {
            title: "Rye Bread, Large".to_string(),
            slug: None,
            description: Some("  ".to_string()),
            unit_price: Decimal::new(450, 2),
            inventory: 3,
        };
        let input = body.into_input().unwrap();
        assert_eq!(input.slug.as_str(), "rye-bread-large");
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_body_validation() {
        let body = ProductBody {
            title: " ".to_string(),
            slug: None,
            description: None,
            unit_price: Decimal::new(50, 2),
            inventory: 0,
        };
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("unit_price"));
        assert!(fields.contains_key("inventory"));
    }
}
