//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer` with a `request_id` span field
//! 3. Request ID
//! 4. Session layer (tower-sessions with `PostgreSQL` store, holds the cart)
//! 5. Rate limiting (governor): relaxed on `/api`, strict on writes that
//!    create users or orders

pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use rate_limit::{api_rate_limiter, checkout_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::create_session_layer;
