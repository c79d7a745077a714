//! Registered storefront customers.

use axum::extract::State;

use crate::db::UserRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::models::User;
use crate::state::AppState;

/// GET /api/admin/users
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list().await?))
}
