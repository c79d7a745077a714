//! Dashboard notifications.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use acsess_core::NotificationId;

use crate::db::{NotificationRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::models::Notification;
use crate::state::AppState;

/// GET /api/admin/notifications
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Notification>>> {
    Ok(Json(
        NotificationRepository::new(state.pool())
            .list_unread()
            .await?,
    ))
}

/// POST /api/admin/notifications/mark-all-read
pub async fn mark_all_read(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let updated = NotificationRepository::new(state.pool())
        .mark_all_read()
        .await?;
    tracing::debug!(updated, "Notifications marked read");
    Ok(Json(json!({ "success": true, "updated": updated })))
}

/// POST /api/admin/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    NotificationRepository::new(state.pool())
        .mark_read(NotificationId::new(id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("Notification not found".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(json!({ "success": true })))
}
