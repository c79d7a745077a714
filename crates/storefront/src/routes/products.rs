//! Product listing and detail.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use acsess_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::models::{Product, ProductFilter, ProductPage};
use crate::state::AppState;

/// Raw listing query; values are normalized by `ProductFilter`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ProductQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter::new(
            self.search.as_deref(),
            self.category.as_deref(),
            self.page.as_deref(),
            self.limit.as_deref(),
        )
    }
}

/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let filter = query.filter();
    Ok(Json(
        ProductRepository::new(state.pool()).search(&filter).await?,
    ))
}

/// GET /api/products/featured
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).featured().await?))
}

/// GET /api/products/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builds_clamped_filter() {
        let query = ProductQuery {
            search: Some("серьги".to_string()),
            category: None,
            page: Some("2".to_string()),
            limit: Some("1000".to_string()),
        };
        let filter = query.filter();
        assert_eq!(filter.search.as_deref(), Some("серьги"));
        assert_eq!((filter.page, filter.limit), (2, 100));
        assert_eq!(filter.offset(), 100);
    }
}
