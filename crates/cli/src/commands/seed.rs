//! Seed the database with demo data.
//!
//! Reads categories, products and site settings from YAML (the built-in
//! `seed/demo.yaml` unless `--file` is given). Categories are matched by
//! name, so seeding twice does not duplicate them; products are only loaded
//! into an empty catalog unless `--reset` wipes it first. A default admin
//! account is created when none exists.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use acsess_admin::db::{
    AdminAccountRepository, CategoryRepository, ProductRepository, RepositoryError,
    SettingsRepository,
};
use acsess_admin::models::{ProductInput, SiteSettings};
use acsess_admin::services::auth::hash_password;
use acsess_admin::services::AdminAuthError;
use acsess_core::{CategoryId, CategoryType};

use super::CommandError;

const DEMO_DATA: &str = include_str!("../../seed/demo.yaml");

/// Login and password of the account created when no admin exists.
const DEFAULT_ADMIN_LOGIN: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "123456";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Product {name:?} refers to unknown category {category:?}")]
    UnknownCategory { name: String, category: String },

    #[error("Invalid product {name:?}: {reason}")]
    InvalidProduct { name: String, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AdminAuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub settings: Option<SiteSettings>,
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: CategoryType,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    pub category: String,
    pub image_url: Option<String>,
}

impl SeedData {
    /// Parse YAML seed data.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not match the seed format.
    pub fn parse(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Seed demo data.
///
/// # Errors
///
/// Returns an error if the seed file is invalid or a database write fails.
pub async fn demo(file: Option<&Path>, reset: bool) -> Result<(), SeedError> {
    let data = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading seed data from file");
            SeedData::parse(&tokio::fs::read_to_string(path).await?)?
        }
        None => SeedData::parse(DEMO_DATA)?,
    };

    let pool = super::connect().await?;

    if reset {
        warn!("Deleting orders, products and categories");
        sqlx::query(
            "TRUNCATE order_item, delivery, customer_order, product, category RESTART IDENTITY CASCADE",
        )
        .execute(&pool)
        .await?;
    }

    let categories = seed_categories(&pool, &data.categories).await?;
    let products = seed_products(&pool, &data.products, &categories).await?;
    let settings = seed_settings(&pool, data.settings.as_ref()).await?;
    let admin = seed_admin(&pool).await?;

    info!("Seeding complete!");
    info!("  Categories: {}", categories.len());
    info!("  Products inserted: {products}");
    info!("  Default settings written: {settings}");
    info!("  Default admin created: {admin}");
    Ok(())
}

async fn seed_categories(
    pool: &PgPool,
    categories: &[SeedCategory],
) -> Result<Vec<(String, CategoryId)>, SeedError> {
    let repo = CategoryRepository::new(pool);
    let mut ids = Vec::with_capacity(categories.len());

    for category in categories {
        let id = match repo
            .create(&category.name, category.description.as_deref(), category.kind)
            .await
        {
            Ok(created) => created.id,
            Err(RepositoryError::Conflict(_)) => {
                repo.find_or_create(&category.name, category.kind).await?.0
            }
            Err(e) => return Err(e.into()),
        };
        ids.push((category.name.to_lowercase(), id));
    }
    Ok(ids)
}

async fn seed_products(
    pool: &PgPool,
    products: &[SeedProduct],
    categories: &[(String, CategoryId)],
) -> Result<usize, SeedError> {
    let repo = ProductRepository::new(pool);
    if !repo.list().await?.is_empty() {
        info!("Catalog already has products, skipping (use --reset to reload)");
        return Ok(0);
    }

    let mut inserted = 0;
    for product in products {
        let category_id = find_category(categories, &product.category).ok_or_else(|| {
            SeedError::UnknownCategory {
                name: product.name.clone(),
                category: product.category.clone(),
            }
        })?;
        let input = ProductInput::new(
            &product.name,
            product.description.as_deref(),
            product.price,
            product.stock,
            Some(category_id),
            product.image_url.as_deref(),
        )
        .map_err(|e| SeedError::InvalidProduct {
            name: product.name.clone(),
            reason: e.to_string(),
        })?;

        repo.create(&input).await?;
        inserted += 1;
    }
    Ok(inserted)
}

fn find_category(categories: &[(String, CategoryId)], name: &str) -> Option<CategoryId> {
    let name = name.trim().to_lowercase();
    categories
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, id)| *id)
}

/// Write settings when none are stored yet.
async fn seed_settings(pool: &PgPool, settings: Option<&SiteSettings>) -> Result<bool, SeedError> {
    let repo = SettingsRepository::new(pool);
    if repo.get("siteTitle").await?.is_some() {
        return Ok(false);
    }
    repo.save_site(&settings.cloned().unwrap_or_default()).await?;
    Ok(true)
}

/// Create the default admin when no account exists.
async fn seed_admin(pool: &PgPool) -> Result<bool, SeedError> {
    let repo = AdminAccountRepository::new(pool);
    if repo.count().await? > 0 {
        return Ok(false);
    }

    let hash = hash_password(DEFAULT_ADMIN_PASSWORD)?;
    repo.create(DEFAULT_ADMIN_LOGIN, &hash, Some("Default administrator"))
        .await?;
    warn!(
        login = DEFAULT_ADMIN_LOGIN,
        "Default admin created with a well-known password; change it with `acsess-cli admin set-password`"
    );
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_demo_data_parses() {
        let data = SeedData::parse(DEMO_DATA).unwrap();
        assert!(!data.categories.is_empty());
        assert!(data.settings.is_some());

        let names: Vec<(String, CategoryId)> = data
            .categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_lowercase(), CategoryId::new(i32::try_from(i).unwrap())))
            .collect();
        for product in &data.products {
            assert!(
                find_category(&names, &product.category).is_some(),
                "{} has unknown category {}",
                product.name,
                product.category
            );
            assert!(product.price > Decimal::ZERO);
        }
    }

    #[test]
    fn test_category_type_defaults() {
        let data = SeedData::parse("categories:\n  - name: Прочее\n").unwrap();
        assert_eq!(data.categories[0].kind, CategoryType::Catalog);
        assert!(data.products.is_empty());
    }

    #[test]
    fn test_find_category_ignores_case() {
        let known = vec![("кольца".to_string(), CategoryId::new(3))];
        assert_eq!(find_category(&known, " Кольца "), Some(CategoryId::new(3)));
        assert_eq!(find_category(&known, "Серьги"), None);
    }
}
