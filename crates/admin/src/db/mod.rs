//! Database operations for the admin API.
//!
//! ## Tables
//!
//! - `admin_account` - Back-office logins (argon2 hashes)
//! - `two_factor_session` - Pending phone-code logins
//! - `setting` - Site settings, one key per row
//! - `category`, `product` - Catalog
//! - `app_user`, `customer_order`, `order_item`, `delivery` - Customers and orders
//! - `notification` - Dashboard notifications
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p acsess-cli -- migrate
//! ```

pub mod admin_accounts;
pub mod categories;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod settings;
pub mod stats;
pub mod two_factor;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_accounts::AdminAccountRepository;
pub use categories::CategoryRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use stats::StatsRepository;
pub use two_factor::TwoFactorRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique login).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-violation into `Conflict`, leaving other errors intact.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(message.to_string())
            }
            _ => Self::Database(err),
        }
    }

    /// Map a foreign-key violation into `Conflict`, leaving other errors intact.
    pub(crate) fn from_foreign_key(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::Conflict(message.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
