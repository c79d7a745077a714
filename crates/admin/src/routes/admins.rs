//! Back-office accounts.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::db::AdminAccountRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::models::AdminAccount;
use crate::services::auth::AdminAuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    pub description: Option<String>,
}

/// GET /api/admin/admins
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<AdminAccount>>> {
    Ok(Json(AdminAccountRepository::new(state.pool()).list().await?))
}

/// POST /api/admin/admins
///
/// 409 when the login is taken.
#[instrument(skip(state, body), fields(login = %body.login))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateAdminRequest>,
) -> Result<impl IntoResponse> {
    let account = AdminAuthService::new(state.pool())
        .create_account(&body.login, &body.password, body.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}
