//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness
//! GET    /health/ready           - Readiness (database)
//!
//! # Catalog
//! GET    /api/products           - In-stock products (search, category, paging)
//! GET    /api/products/featured  - Newest in-stock products
//! GET    /api/products/{id}      - Product detail
//! GET    /api/categories         - Categories by name
//! GET    /api/settings           - Public site settings
//!
//! # Cart (session)
//! GET    /api/cart               - Reconciled cart
//! DELETE /api/cart               - Empty the cart
//! POST   /api/cart/add           - Add a product
//! POST   /api/cart/update        - Set a quantity (0 removes)
//! POST   /api/cart/remove        - Remove a product
//! GET    /api/cart/count         - Number of units
//!
//! # Checkout (strict rate limit)
//! POST   /api/cart/checkout      - Order the session cart
//! POST   /api/orders             - Order explicit items
//! POST   /api/users              - Register a customer
//! ```

pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/featured", get(products::featured))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(categories::index))
        .route("/settings", get(settings::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Routes that create users or orders.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/checkout", post(cart::checkout))
        .route("/orders", post(orders::create))
        .route("/users", post(users::register))
        .layer(checkout_rate_limiter())
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .merge(checkout_routes())
        .layer(api_rate_limiter());

    Router::new().nest("/api", api)
}
