//! Product management, spreadsheet import and CSV export.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use acsess_core::{CategoryId, ProductId};

use super::Numeric;
use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::models::{Product, ProductInput};
use crate::services::import::{self, ProductImporter, RawRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Numeric>,
    pub stock: Option<Numeric>,
    #[serde(alias = "categoryId")]
    pub category_id: Option<Numeric>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
}

impl ProductRequest {
    fn into_input(self) -> Result<ProductInput> {
        let price = self
            .price
            .as_ref()
            .map(Numeric::to_decimal)
            .transpose()
            .map_err(AppError::BadRequest)?
            .ok_or_else(|| AppError::BadRequest("Price is required".to_string()))?;
        let stock = self
            .stock
            .as_ref()
            .map(Numeric::to_i64)
            .transpose()
            .map_err(AppError::BadRequest)?
            .unwrap_or(0);
        let category_id = self
            .category_id
            .as_ref()
            .map(Numeric::to_i64)
            .transpose()
            .map_err(AppError::BadRequest)?
            .and_then(|id| i32::try_from(id).ok())
            .map(CategoryId::new);

        ProductInput::new(
            &self.name,
            self.description.as_deref(),
            price,
            stock,
            category_id,
            self.image_url.as_deref(),
        )
        .map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

async fn ensure_category(state: &AppState, input: &ProductInput) -> Result<()> {
    if CategoryRepository::new(state.pool())
        .exists(input.category_id)
        .await?
    {
        Ok(())
    } else {
        Err(AppError::BadRequest("Category does not exist".to_string()))
    }
}

fn not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
        RepositoryError::Conflict(msg) => AppError::BadRequest(msg),
        other => other.into(),
    }
}

/// GET /api/admin/products
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list().await?))
}

/// GET /api/admin/products/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// POST /api/admin/products
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ProductRequest>,
) -> Result<impl IntoResponse> {
    let input = body.into_input()?;
    ensure_category(&state, &input).await?;

    let repo = ProductRepository::new(state.pool());
    let id = repo.create(&input).await.map_err(not_found)?;
    let product = repo.get(id).await?.ok_or_else(|| {
        AppError::Internal(format!("product {id} vanished after insert"))
    })?;

    tracing::info!(id = %id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/admin/products/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    let input = body.into_input()?;
    ensure_category(&state, &input).await?;

    let repo = ProductRepository::new(state.pool());
    repo.update(id, &input).await.map_err(not_found)?;
    repo.get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// DELETE /api/admin/products/{id}
///
/// Products that appear in orders cannot be deleted (400).
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await
        .map_err(not_found)?;
    tracing::info!(id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct ImportJson {
    pub products: Option<Vec<Map<String, Value>>>,
}

/// POST /api/admin/products/import
///
/// Accepts `{"products": [...]}` or a multipart CSV upload in field `file`.
#[instrument(skip(state, request))]
pub async fn import_products(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let rows = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        rows_from_upload(multipart).await?
    } else {
        let Json(body) = Json::<ImportJson>::from_request(request, &state).await?;
        let products = body
            .products
            .ok_or_else(|| AppError::BadRequest("Invalid data format".to_string()))?;
        import::rows_from_json(products)
    };

    let report = ProductImporter::new(state.pool()).import(&rows).await?;

    Ok(Json(json!({
        "message": report.summary(),
        "results": report,
    })))
}

async fn rows_from_upload(mut multipart: Multipart) -> Result<Vec<RawRow>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(import::rows_from_csv(&bytes)?);
    }
    Err(AppError::BadRequest("File not found".to_string()))
}

/// GET /api/admin/products/export
pub async fn export_products(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool()).list().await?;
    let csv = import::export_csv(&products)
        .map_err(|e| AppError::Internal(format!("CSV export failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"products.csv\"",
            ),
        ],
        csv,
    ))
}
