//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration (argon2 password hashing)
//! - `checkout` - Order placement with stock reservation

pub mod auth;
pub mod checkout;

pub use auth::{AuthError, AuthService, Registration};
pub use checkout::{CheckoutService, OrderError, OrderForm};
