//! Admin token cookie handling.
//!
//! Every `/api/admin/*` request must carry a valid `admin-token` cookie. The
//! [`require_admin`] middleware enforces that for a whole router, and the
//! [`AdminSession`] extractor exposes the verified claims to handlers.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use crate::error::ErrorBody;
use crate::services::auth::{AdminClaims, SESSION_TTL, TokenError};
use crate::state::AppState;

/// Name of the cookie holding the admin token.
pub const ADMIN_COOKIE: &str = "admin-token";

/// Verified admin claims for the current request.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminClaims);

/// Why a request was turned away at the admin gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// No cookie at all.
    MissingToken,
    /// Cookie present but the token did not verify; the cookie is cleared.
    InvalidToken { secure: bool },
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "Authorization required".to_string(),
                }),
            )
                .into_response(),
            Self::InvalidToken { secure } => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorBody {
                        error: "Invalid token".to_string(),
                    }),
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&clear_cookie(secure)) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                response
            }
        }
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Self>() {
            return Ok(session.clone());
        }
        authenticate(&parts.headers, state).map(Self)
    }
}

/// Reject requests without a valid admin token.
///
/// The claims are stored in the request extensions for [`AdminSession`].
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state) {
        Ok(claims) => {
            request.extensions_mut().insert(AdminSession(claims));
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AdminClaims, AdminAuthRejection> {
    let token = read_cookie(headers, ADMIN_COOKIE).ok_or(AdminAuthRejection::MissingToken)?;

    state.tokens().verify(&token).map_err(|e| {
        match e {
            TokenError::Expired => tracing::debug!("Expired admin token"),
            other => tracing::info!(error = %other, "Rejected admin token"),
        }
        AdminAuthRejection::InvalidToken {
            secure: state.config().is_https(),
        }
    })
}

/// Value of a named cookie from the `Cookie` request headers.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a fresh admin token.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> String {
    build_cookie(token, Duration::seconds(SESSION_TTL.num_seconds()), secure)
}

/// `Set-Cookie` value that removes the admin token.
#[must_use]
pub fn clear_cookie(secure: bool) -> String {
    build_cookie("", Duration::ZERO, secure)
}

fn build_cookie(value: &str, max_age: Duration, secure: bool) -> String {
    Cookie::build((ADMIN_COOKIE, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap_or_else(|_| HeaderValue::from_static("")));
        headers
    }

    #[test]
    fn test_read_cookie() {
        let h = headers("theme=dark; admin-token=abc.def.ghi; other=1");
        assert_eq!(read_cookie(&h, ADMIN_COOKIE).as_deref(), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&h, "missing"), None);
        assert_eq!(read_cookie(&headers("admin-token="), ADMIN_COOKIE), None);
        assert_eq!(read_cookie(&HeaderMap::new(), ADMIN_COOKIE), None);
        assert_eq!(
            read_cookie(&headers("admin-token=\"quoted\""), ADMIN_COOKIE).as_deref(),
            Some("quoted")
        );
    }

    #[test]
    fn test_session_cookie_round_trips_through_parser() {
        let set_cookie = session_cookie("abc.def.ghi", true);
        let parsed = Cookie::parse(set_cookie.as_str()).unwrap();
        assert_eq!(parsed.name(), ADMIN_COOKIE);
        assert_eq!(parsed.value(), "abc.def.ghi");
        assert_eq!(parsed.http_only(), Some(true));
        assert_eq!(parsed.secure(), Some(true));
        assert_eq!(parsed.same_site(), Some(SameSite::Lax));
        assert_eq!(parsed.path(), Some("/"));
        assert_eq!(parsed.max_age(), Some(Duration::hours(24)));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", false);
        assert!(cookie.starts_with("admin-token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));
        assert!(session_cookie("tok", true).contains("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_cookie(true);
        assert!(cookie.starts_with("admin-token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_invalid_token_rejection_clears_cookie() {
        let response = AdminAuthRejection::InvalidToken { secure: false }.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap_or_default();
        assert!(set_cookie.contains("Max-Age=0"));

        let response = AdminAuthRejection::MissingToken.into_response();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
