//! Site settings.

use axum::{extract::State, response::IntoResponse};
use serde_json::json;
use tracing::instrument;

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::models::SiteSettings;
use crate::state::AppState;

/// GET /api/admin/settings
///
/// Stored values merged over the defaults, secure keys included.
pub async fn show(State(state): State<AppState>) -> Result<Json<SiteSettings>> {
    Ok(Json(SettingsRepository::new(state.pool()).load_site().await?))
}

/// POST /api/admin/settings
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    Json(settings): Json<SiteSettings>,
) -> Result<impl IntoResponse> {
    SettingsRepository::new(state.pool())
        .save_site(&settings)
        .await?;

    tracing::info!(
        telegram_notifications = settings.telegram_notifications,
        "Site settings saved"
    );
    Ok(Json(json!({ "success": true, "message": "Settings saved" })))
}
