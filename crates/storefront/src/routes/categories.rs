//! Public category list.

use axum::extract::State;

use crate::db::CategoryRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::models::Category;
use crate::state::AppState;

/// GET /api/categories
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}
