//! Customer registration.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::extract::Json;
use crate::models::User;
use crate::services::{AuthService, Registration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
}

/// POST /api/users
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(Registration {
            name: &body.name,
            email: &body.email,
            password: &body.password,
            phone: body.phone.as_deref(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
