//! Admin account repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use acsess_core::AdminAccountId;

use super::RepositoryError;
use crate::models::AdminAccount;

#[derive(Debug, sqlx::FromRow)]
struct AdminAccountRow {
    id: i32,
    login: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdminAccountRow> for AdminAccount {
    fn from(row: AdminAccountRow) -> Self {
        Self {
            id: AdminAccountId::new(row.id),
            login: row.login,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for back-office logins.
pub struct AdminAccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminAccountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Number of configured accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_account")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// List accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminAccount>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminAccountRow>(
            r"
            SELECT id, login, description, created_at, updated_at
            FROM admin_account
            ORDER BY created_at
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Fetch the stored hash for a login, if the login exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn password_hash_for(&self, login: &str) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM admin_account WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(self.pool)
        .await?;
        Ok(hash)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the login is taken.
    pub async fn create(
        &self,
        login: &str,
        password_hash: &str,
        description: Option<&str>,
    ) -> Result<AdminAccount, RepositoryError> {
        let row = sqlx::query_as::<_, AdminAccountRow>(
            r"
            INSERT INTO admin_account (login, password_hash, description)
            VALUES ($1, $2, $3)
            RETURNING id, login, description, created_at, updated_at
            ",
        )
        .bind(login)
        .bind(password_hash)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "login already exists"))?;

        Ok(row.into())
    }

    /// Replace the password hash for a login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the login does not exist.
    pub async fn set_password_hash(
        &self,
        login: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admin_account SET password_hash = $2, updated_at = now() WHERE login = $1",
        )
        .bind(login)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
