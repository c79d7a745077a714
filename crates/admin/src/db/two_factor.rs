//! Two-factor session storage.
//!
//! Verification consumes a session with a single `DELETE ... RETURNING`, so
//! two concurrent requests carrying the same code cannot both succeed.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use acsess_core::TwoFactorSessionId;

use super::RepositoryError;
use crate::models::TwoFactorSession;

#[derive(Debug, sqlx::FromRow)]
struct TwoFactorSessionRow {
    id: Uuid,
    phone: String,
    code: String,
    expires_at: DateTime<Utc>,
    attempts: i32,
    resend_count: i32,
    last_sent_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<TwoFactorSessionRow> for TwoFactorSession {
    fn from(row: TwoFactorSessionRow) -> Self {
        Self {
            id: TwoFactorSessionId::from_uuid(row.id),
            phone: row.phone,
            code: row.code,
            expires_at: row.expires_at,
            attempts: row.attempts,
            resend_count: row.resend_count,
            last_sent_at: row.last_sent_at,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str =
    "id, phone, code, expires_at, attempts, resend_count, last_sent_at, created_at";

/// Repository for two-factor sessions.
pub struct TwoFactorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TwoFactorRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        phone: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<TwoFactorSession, RepositoryError> {
        let row = sqlx::query_as::<_, TwoFactorSessionRow>(&format!(
            r"
            INSERT INTO two_factor_session (id, phone, code, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "
        ))
        .bind(TwoFactorSessionId::generate().as_uuid())
        .bind(phone)
        .bind(code)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Look up a session by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        id: TwoFactorSessionId,
    ) -> Result<Option<TwoFactorSession>, RepositoryError> {
        let row = sqlx::query_as::<_, TwoFactorSessionRow>(&format!(
            "SELECT {COLUMNS} FROM two_factor_session WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Delete the session if and only if `code` matches and it has not
    /// expired. Returns the consumed session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(
        &self,
        id: TwoFactorSessionId,
        code: &str,
    ) -> Result<Option<TwoFactorSession>, RepositoryError> {
        let row = sqlx::query_as::<_, TwoFactorSessionRow>(&format!(
            r"
            DELETE FROM two_factor_session
            WHERE id = $1 AND code = $2 AND expires_at > now()
            RETURNING {COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Increment the failed-attempt counter, returning the new count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the session is gone.
    pub async fn record_failed_attempt(
        &self,
        id: TwoFactorSessionId,
    ) -> Result<i32, RepositoryError> {
        sqlx::query_scalar::<_, i32>(
            r"
            UPDATE two_factor_session SET attempts = attempts + 1
            WHERE id = $1
            RETURNING attempts
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Replace the code and expiry of a session and count the resend.
    ///
    /// The cooldown and the resend cap are part of the `WHERE` clause, so of
    /// several concurrent resends at most one passes. `None` means the session
    /// is gone or one of the limits refused the update; the caller re-reads the
    /// row to tell which.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn regenerate(
        &self,
        id: TwoFactorSessionId,
        code: &str,
        expires_at: DateTime<Utc>,
        max_resends: i32,
        cooldown: Duration,
    ) -> Result<Option<TwoFactorSession>, RepositoryError> {
        let row = sqlx::query_as::<_, TwoFactorSessionRow>(&format!(
            r"
            UPDATE two_factor_session
            SET code = $2, expires_at = $3, attempts = 0,
                resend_count = resend_count + 1, last_sent_at = now()
            WHERE id = $1
              AND resend_count < $4
              AND last_sent_at <= now() - $5 * interval '1 second'
            RETURNING {COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(code)
        .bind(expires_at)
        .bind(max_resends)
        .bind(cooldown.num_seconds())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Delete a session. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: TwoFactorSessionId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM two_factor_session WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every expired session. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM two_factor_session WHERE expires_at <= now()")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
