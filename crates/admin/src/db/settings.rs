//! Settings database operations.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::SiteSettings;

/// Repository for the key/value `setting` table.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a single setting value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
        let value = sqlx::query_scalar::<_, JsonValue>("SELECT value FROM setting WHERE key = $1")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }

    /// Load all site settings merged over defaults.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load_site(&self) -> Result<SiteSettings, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, JsonValue)>("SELECT key, value FROM setting")
            .fetch_all(self.pool)
            .await?;
        Ok(SiteSettings::from_entries(rows))
    }

    /// Replace every site setting in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the settings cannot be
    /// serialized, or `RepositoryError::Database` if a write fails.
    pub async fn save_site(&self, settings: &SiteSettings) -> Result<(), RepositoryError> {
        let entries = settings
            .to_entries()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM setting WHERE key = ANY($1)")
            .bind(SiteSettings::keys())
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            sqlx::query(
                r"
                INSERT INTO setting (key, value, is_secure, updated_at)
                VALUES ($1, $2, $3, now())
                ",
            )
            .bind(&entry.key)
            .bind(&entry.value)
            .bind(entry.is_secure)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
