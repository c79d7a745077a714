//! Public site settings.

use axum::extract::State;
use serde_json::{Map, Value};

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::state::AppState;

/// GET /api/settings
///
/// Only rows not flagged as secure are returned.
pub async fn show(State(state): State<AppState>) -> Result<Json<Map<String, Value>>> {
    Ok(Json(SettingsRepository::new(state.pool()).public().await?))
}
