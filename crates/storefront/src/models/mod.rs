//! Domain models for storefront.
//!
//! Row types stay private to `db`; these are the validated shapes handlers and
//! services work with.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{Cart, CartItemView, CartLine, CartView};
pub use catalog::{Category, Pagination, Product, ProductFilter, ProductPage};
pub use order::{NewOrder, OrderLine, PlacedOrder};
pub use user::User;

/// Session keys used by the storefront.
pub mod session_keys {
    /// Key for the shopping cart.
    pub const CART: &str = "cart";
}
