//! Catalog reads for shoppers.

use sqlx::PgPool;

use acsess_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::{Pagination, Product, ProductFilter, ProductPage};

/// Featured products shown on the home page.
pub const FEATURED_LIMIT: i64 = 12;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Price,
    stock: i32,
    image_url: Option<String>,
    category_name: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            image_url: row.image_url,
            description: row.description,
            category_name: row.category_name,
            in_stock: row.stock > 0,
            stock: row.stock,
        }
    }
}

const SELECT_PRODUCT: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.stock, p.image_url,
           c.name AS category_name
    FROM product p
    JOIN category c ON c.id = p.category_id
";

/// `$1` search pattern, `$2` category name; both optional.
const FILTER: &str = r"
    WHERE p.stock > 0
      AND ($1::text IS NULL OR p.name ILIKE $1 OR p.description ILIKE $1)
      AND ($2::text IS NULL OR lower(c.name) = lower($2))
";

pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// In-stock products matching the filter, newest first, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(&self, filter: &ProductFilter) -> Result<ProductPage, RepositoryError> {
        let pattern = filter.search_pattern();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM product p JOIN category c ON c.id = p.category_id {FILTER}"
        ))
        .bind(&pattern)
        .bind(&filter.category)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_PRODUCT} {FILTER} ORDER BY p.created_at DESC, p.id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(&pattern)
        .bind(&filter.category)
        .bind(filter.limit)
        .bind(filter.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(ProductPage {
            products: rows.into_iter().map(Into::into).collect(),
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    /// Newest in-stock products, ties broken by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_PRODUCT} WHERE p.stock > 0 ORDER BY p.created_at DESC, p.name LIMIT $1"
        ))
        .bind(FEATURED_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// A single product, in stock or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Products for a set of ids; unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE p.id = ANY($1)"))
            .bind(ids)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
