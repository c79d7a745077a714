//! HTTP middleware for admin.
//!
//! # Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer` with a `request_id` span field
//! 3. Request ID
//! 4. Per-router: auth rate limiter on `/api/auth`, admin gate on `/api/admin`

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{
    ADMIN_COOKIE, AdminAuthRejection, AdminSession, clear_cookie, require_admin, session_cookie,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
