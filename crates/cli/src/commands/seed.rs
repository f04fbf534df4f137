//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - title: Country Sourdough
//!     unit_price: "6.50"
//!     inventory: 40
//!   - title: Rye Loaf
//!     slug: rye
//!     description: Dense and dark.
//!     unit_price: "5.25"
//!     inventory: 25
//! collections:
//!   - title: Bread
//!     featured: rye
//! promotions:
//!   - description: Weekend bake sale
//!     discount: 0.15
//!     products: [rye]
//! ```
//!
//! Collections and promotions refer to products by slug. The whole file is
//! validated before anything is written.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use aladabuy_core::{ProductId, Slug, UnitPrice};
use aladabuy_storefront::db::{CollectionRepository, ProductRepository, PromotionRepository};
use aladabuy_storefront::models::ProductInput;

use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub inventory: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCollection {
    pub title: String,
    /// Slug of the featured product.
    pub featured: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPromotion {
    pub description: String,
    pub discount: f64,
    /// Slugs of the products it applies to.
    #[serde(default)]
    pub products: Vec<String>,
}

/// A catalog file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCatalog {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub collections: Vec<SeedCollection>,
    #[serde(default)]
    pub promotions: Vec<SeedPromotion>,
}

/// Catalog whose values have all been checked.
#[derive(Debug)]
pub struct ValidCatalog<'a> {
    pub products: Vec<ProductInput>,
    /// Title and featured product slug.
    pub collections: Vec<(&'a str, Option<&'a str>)>,
    /// Promotion and the slugs it applies to.
    pub promotions: Vec<(&'a SeedPromotion, Vec<&'a str>)>,
}

/// Counts of rows written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub products: usize,
    pub collections: usize,
    pub promotions: usize,
}

impl SeedProduct {
    fn input(&self) -> Result<ProductInput, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("title may not be blank".to_string());
        }
        let slug = match self.slug.as_deref() {
            Some(raw) => Slug::parse(raw).map_err(|e| format!("slug: {e}"))?,
            None => Slug::from_title(title)
                .ok_or_else(|| "slug: cannot derive one from the title".to_string())?,
        };
        let unit_price = UnitPrice::new(self.unit_price).map_err(|e| format!("unit_price: {e}"))?;
        if self.inventory < 1 {
            return Err("inventory: Ensure this value is greater than or equal to 1.".to_string());
        }

        Ok(ProductInput {
            title: title.to_string(),
            slug,
            description: self.description.clone().filter(|d| !d.trim().is_empty()),
            unit_price,
            inventory: self.inventory,
        })
    }
}

fn known<'a>(
    slugs: &HashSet<&str>,
    raw: &'a str,
    context: &str,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    if slugs.contains(raw) {
        Some(raw)
    } else {
        errors.push(format!("{context}: unknown product slug \"{raw}\""));
        None
    }
}

impl SeedCatalog {
    /// Check every entry, collecting all problems rather than stopping at the
    /// first.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid entry.
    pub fn validate(&self) -> Result<ValidCatalog<'_>, Vec<String>> {
        let mut errors = Vec::new();
        let mut products = Vec::with_capacity(self.products.len());

        for (i, product) in self.products.iter().enumerate() {
            match product.input() {
                Ok(input) => products.push(input),
                Err(e) => errors.push(format!("products[{i}] ({}): {e}", product.title)),
            }
        }

        let mut seen = HashSet::new();
        for input in &products {
            if !seen.insert(input.slug.as_str()) {
                errors.push(format!("duplicate product slug \"{}\"", input.slug));
            }
        }

        let mut collections = Vec::with_capacity(self.collections.len());
        for (i, collection) in self.collections.iter().enumerate() {
            let title = collection.title.trim();
            if title.is_empty() {
                errors.push(format!("collections[{i}]: title may not be blank"));
            }
            let featured = collection
                .featured
                .as_deref()
                .and_then(|raw| known(&seen, raw, &format!("collections[{i}]"), &mut errors));
            collections.push((title, featured));
        }

        let mut promotions = Vec::with_capacity(self.promotions.len());
        for (i, promotion) in self.promotions.iter().enumerate() {
            if promotion.description.trim().is_empty() {
                errors.push(format!("promotions[{i}]: description may not be blank"));
            }
            if promotion.discount.is_nan() || promotion.discount < 0.0 {
                errors.push(format!("promotions[{i}]: discount must be non-negative"));
            }
            let slugs = promotion
                .products
                .iter()
                .filter_map(|raw| known(&seen, raw, &format!("promotions[{i}]"), &mut errors))
                .collect();
            promotions.push((promotion, slugs));
        }

        if errors.is_empty() {
            Ok(ValidCatalog {
                products,
                collections,
                promotions,
            })
        } else {
            Err(errors)
        }
    }
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;
    let valid = catalog.validate().map_err(|errors| {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        CommandError::Invalid(format!("{} validation errors found", errors.len()))
    })?;
    info!(
        products = valid.products.len(),
        collections = valid.collections.len(),
        promotions = valid.promotions.len(),
        "Catalog validated"
    );

    let pool = connect().await?;
    let mut ids: HashMap<&str, ProductId> = HashMap::new();
    let mut summary = SeedSummary::default();

    let products = ProductRepository::new(&pool);
    for input in &valid.products {
        let product = products.create(input).await?;
        ids.insert(input.slug.as_str(), product.id);
        summary.products += 1;
    }

    let collections = CollectionRepository::new(&pool);
    for (title, featured) in &valid.collections {
        let featured = featured.and_then(|slug| ids.get(slug).copied());
        collections.create(title, featured).await?;
        summary.collections += 1;
    }

    let promotions = PromotionRepository::new(&pool);
    for (promotion, slugs) in &valid.promotions {
        let created = promotions
            .create(promotion.description.trim(), promotion.discount)
            .await?;
        for slug in slugs {
            if let Some(product) = ids.get(slug) {
                promotions.attach(*product, created.id).await?;
            }
        }
        summary.promotions += 1;
    }

    info!(
        products = summary.products,
        collections = summary.collections,
        promotions = summary.promotions,
        "Seeding complete!"
    );
    Ok(summary)
}
