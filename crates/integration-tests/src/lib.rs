//! Shared fixtures for the Acsess integration tests.
//!
//! # Running Tests
//!
//! Every test gets a fresh database from `#[sqlx::test]` with `migrations/`
//! applied. They are ignored by default because they need a server:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/acsess cargo test -p acsess-integration-tests -- --ignored
//! ```

use std::str::FromStr;

use axum::Router;
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;

use acsess_admin::config::{AdminConfig, StorageConfig, TelegramConfig};
use acsess_admin::state::AppState;
use acsess_core::{CategoryId, ProductId};

/// HS256 key used by every test router.
pub const TEST_JWT_SECRET: &str = "kq3Z8vX2pL9mW4nR7tY1bC6dF0gH5jSe";

/// Admin config with Telegram unset, so login codes go to the log.
#[must_use]
pub fn admin_config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://localhost/acsess_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        telegram: TelegramConfig::default(),
        storage: StorageConfig {
            upload_dir: std::env::temp_dir().join("acsess-integration-uploads"),
            s3: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// Admin state over the test pool.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn admin_state(pool: PgPool) -> AppState {
    AppState::new(admin_config(), pool).expect("admin state")
}

/// The admin API router, ready for `oneshot`.
#[must_use]
pub fn admin_router(state: &AppState) -> Router {
    acsess_admin::routes::routes(state).with_state(state.clone())
}

/// Insert a category.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn insert_category(pool: &PgPool, name: &str) -> CategoryId {
    let id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO category (name, type) VALUES ($1, 'catalog') RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("insert category");
    CategoryId::new(id)
}

/// Insert a product with the given price (as text) and stock.
///
/// # Panics
///
/// Panics if the price does not parse or the insert fails.
pub async fn insert_product(
    pool: &PgPool,
    category: CategoryId,
    name: &str,
    price: &str,
    stock: i32,
) -> ProductId {
    let price = Decimal::from_str(price).expect("price");
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO product (name, price, stock, category_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(category)
    .fetch_one(pool)
    .await
    .expect("insert product");
    ProductId::new(id)
}

/// Current stock of a product.
///
/// # Panics
///
/// Panics if the product does not exist.
pub async fn stock_of(pool: &PgPool, product: ProductId) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT stock FROM product WHERE id = $1")
        .bind(product)
        .fetch_one(pool)
        .await
        .expect("product stock")
}
