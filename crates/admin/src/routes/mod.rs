//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (database)
//! GET  /uploads/*                      - Locally stored product images
//!
//! # Login (rate limited per client IP)
//! POST /api/auth/validate-login        - Check login and password
//! POST /api/auth/send-code             - Start a phone-code session
//! POST /api/auth/verify-code           - Finish login, sets `admin-token`
//! POST /api/auth/resend-code           - New code for a pending session
//! POST /api/auth/logout                - Clear `admin-token`
//!
//! # Admin API (requires `admin-token`)
//! GET|POST        /api/admin/categories
//! GET|PUT|DELETE  /api/admin/categories/{id}
//! GET|POST        /api/admin/products
//! POST            /api/admin/products/import
//! GET             /api/admin/products/export
//! GET|PUT|DELETE  /api/admin/products/{id}
//! GET|POST        /api/admin/orders
//! GET             /api/admin/orders/stats
//! GET|PUT|DELETE  /api/admin/orders/{id}
//! GET             /api/admin/stats
//! GET             /api/admin/recent-orders
//! GET             /api/admin/popular-products
//! GET             /api/admin/notifications
//! POST            /api/admin/notifications/mark-all-read
//! POST            /api/admin/notifications/{id}/read
//! GET|POST        /api/admin/settings
//! GET|POST        /api/admin/admins
//! GET             /api/admin/users
//! POST            /api/admin/upload/image
//! ```

pub mod admins;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod settings;
pub mod uploads;
pub mod users;

use std::str::FromStr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::middleware::{auth_rate_limiter, require_admin};
use crate::services::storage::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Body limit for multipart uploads: the largest image plus form overhead.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// A number that clients may send either as JSON number or as text.
///
/// Spreadsheet exports and form posts often quote numbers and use a decimal
/// comma, so both `1500.5` and `"1 500,50"` are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

impl Numeric {
    /// Parse as a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message when the value is not a number.
    pub fn to_decimal(&self) -> Result<Decimal, String> {
        let text = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => normalize(s),
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| format!("Invalid number: {text}"))
    }

    /// Parse as a whole number.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for fractions and non-numbers.
    pub fn to_i64(&self) -> Result<i64, String> {
        match self {
            Self::Number(n) => n
                .as_i64()
                .ok_or_else(|| format!("Expected a whole number, got {n}")),
            Self::Text(s) => {
                let text = normalize(s);
                text.parse()
                    .map_err(|_| format!("Expected a whole number, got {text}"))
            }
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Login routes, throttled per client IP.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/validate-login", post(auth::validate_login))
        .route("/send-code", post(auth::send_code))
        .route("/verify-code", post(auth::verify_code))
        .route("/resend-code", post(auth::resend_code))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Catalog routes.
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/import",
            post(products::import_products).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/products/export", get(products::export_products))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/upload/image",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

/// Orders and dashboard routes.
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/stats", get(orders::stats))
        .route(
            "/orders/{id}",
            get(orders::show).put(orders::update).delete(orders::delete),
        )
        .route("/stats", get(dashboard::stats))
        .route("/recent-orders", get(dashboard::recent_orders))
        .route("/popular-products", get(dashboard::popular_products))
}

/// Admin routes, every one behind the `admin-token` gate.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(order_routes())
        .route("/notifications", get(notifications::index))
        .route(
            "/notifications/mark-all-read",
            post(notifications::mark_all_read),
        )
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/settings", get(settings::show).post(settings::update))
        .route("/admins", get(admins::index).post(admins::create))
        .route("/users", get(users::index))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

/// Create all API routes for admin.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/admin", admin_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Numeric {
        Numeric::Text(s.to_string())
    }

    #[test]
    fn test_decimal_comma_and_spaces() {
        assert_eq!(text("1 500,50").to_decimal(), Ok(Decimal::new(150_050, 2)));
        assert_eq!(text("99.9").to_decimal(), Ok(Decimal::new(999, 1)));
        assert!(text("abc").to_decimal().is_err());
    }

    #[test]
    fn test_json_numbers() {
        let n: Numeric = serde_json::from_str("12.5").unwrap_or(Numeric::Text(String::new()));
        assert_eq!(n.to_decimal(), Ok(Decimal::new(125, 1)));
        assert!(n.to_i64().is_err());

        let n: Numeric = serde_json::from_str("7").unwrap_or(Numeric::Text(String::new()));
        assert_eq!(n.to_i64(), Ok(7));
    }

    #[test]
    fn test_text_integers() {
        assert_eq!(text(" 42 ").to_i64(), Ok(42));
        assert!(text("4.2").to_i64().is_err());
    }
}
