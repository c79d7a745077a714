//! Category management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use acsess_core::{CategoryId, CategoryType};

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::models::Category;
use crate::models::catalog::non_blank;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl CategoryRequest {
    fn validate(&self) -> Result<(&str, Option<String>, CategoryType)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Category name is required".to_string()));
        }
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => CategoryType::default(),
            Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
        };
        Ok((name, non_blank(self.description.as_deref()), kind))
    }
}

/// GET /api/admin/categories
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// GET /api/admin/categories/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(CategoryId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// POST /api/admin/categories
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<impl IntoResponse> {
    let (name, description, kind) = body.validate()?;
    let category = CategoryRepository::new(state.pool())
        .create(name, description.as_deref(), kind)
        .await?;
    tracing::info!(id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/admin/categories/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    let (name, description, kind) = body.validate()?;
    let category = CategoryRepository::new(state.pool())
        .update(CategoryId::new(id), name, description.as_deref(), kind)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Category not found".to_string()),
            other => other.into(),
        })?;
    Ok(Json(category))
}

/// DELETE /api/admin/categories/{id}
///
/// Refused with 400 while products still reference the category.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Category not found".to_string()),
            RepositoryError::Conflict(msg) => {
                AppError::BadRequest(format!("Cannot delete category: {msg}"))
            }
            other => other.into(),
        })?;

    tracing::info!(id, "Category deleted");
    Ok(Json(json!({ "message": "Category deleted" })))
}
