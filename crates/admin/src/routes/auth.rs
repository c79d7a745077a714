//! Two-factor login endpoints under `/api/auth`.

use axum::{
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::{Result, set_sentry_admin};
use crate::extract::Json;
use crate::middleware::{clear_cookie, session_cookie};
use crate::services::auth::AdminAuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendCodeRequest {
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSentResponse {
    pub success: bool,
    pub session_id: String,
    pub phone_number: String,
    pub message: &'static str,
}

/// POST /api/auth/validate-login
#[instrument(skip(state, body), fields(login = %body.login))]
pub async fn validate_login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    AdminAuthService::new(state.pool())
        .validate_credentials(&body.login, &body.password)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Credentials accepted, enter your phone number",
    })))
}

/// POST /api/auth/send-code
#[instrument(skip(state, body), fields(login = %body.login))]
pub async fn send_code(
    State(state): State<AppState>,
    Json(body): Json<SendCodeRequest>,
) -> Result<Json<CodeSentResponse>> {
    let sent = AdminAuthService::new(state.pool())
        .send_code(
            &body.login,
            &body.password,
            &body.phone_number,
            state.delivery(),
        )
        .await?;

    Ok(Json(CodeSentResponse {
        success: true,
        session_id: sent.session_id.to_string(),
        phone_number: sent.phone.as_str().to_string(),
        message: "Code sent",
    }))
}

/// POST /api/auth/verify-code
///
/// On success sets the `admin-token` cookie.
#[instrument(skip(state, body))]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<Response> {
    let verified = AdminAuthService::new(state.pool())
        .verify_code(&body.session_id, &body.code, state.tokens())
        .await?;

    if let Ok(phone) = acsess_core::PhoneNumber::parse(&verified.phone) {
        set_sentry_admin(&phone.masked());
    }

    let mut response = Json(json!({
        "success": true,
        "message": "Signed in",
    }))
    .into_response();
    append_cookie(
        &mut response,
        &session_cookie(&verified.token, state.config().is_https()),
    );
    Ok(response)
}

/// POST /api/auth/resend-code
#[instrument(skip(state, body))]
pub async fn resend_code(
    State(state): State<AppState>,
    Json(body): Json<ResendCodeRequest>,
) -> Result<Json<CodeSentResponse>> {
    let sent = AdminAuthService::new(state.pool())
        .resend_code(&body.session_id, state.delivery())
        .await?;

    Ok(Json(CodeSentResponse {
        success: true,
        session_id: sent.session_id.to_string(),
        phone_number: sent.phone.as_str().to_string(),
        message: "New code sent",
    }))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    sentry::configure_scope(|scope| scope.set_user(None));

    let mut response = Json(json!({ "success": true })).into_response();
    append_cookie(&mut response, &clear_cookie(state.config().is_https()));
    response
}

fn append_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}
