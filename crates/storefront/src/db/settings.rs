//! Public site settings.

use serde_json::{Map, Value};
use sqlx::PgPool;

use super::RepositoryError;

pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every non-secure setting as one JSON object keyed by setting name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn public(&self) -> Result<Map<String, Value>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, Value)>(
            "SELECT key, value FROM setting WHERE NOT is_secure ORDER BY key",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
