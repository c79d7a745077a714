//! Customer accounts.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use acsess_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    phone: Option<String>,
    role: UserRole,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

/// Repository for customer accounts.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a client with a password.
    ///
    /// A guest customer created at checkout (no password yet) is claimed in
    /// place, keeping their order history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a registered account already
    /// uses the email.
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        phone: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO app_user (name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, 'client')
            ON CONFLICT (email) DO UPDATE
                SET name = EXCLUDED.name,
                    phone = COALESCE(EXCLUDED.phone, app_user.phone),
                    password_hash = EXCLUDED.password_hash,
                    updated_at = now()
                WHERE app_user.password_hash IS NULL
            RETURNING id, name, email, phone, role, created_at
            ",
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("email already registered".to_string()))?;

        row.try_into()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, phone, role, created_at FROM app_user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

/// Find a customer by email or create a guest client for them.
///
/// Runs on the caller's connection so it can join the order transaction.
pub(crate) async fn find_or_create_client(
    conn: &mut PgConnection,
    name: &str,
    email: &Email,
    phone: Option<&str>,
) -> Result<UserId, RepositoryError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO app_user (name, email, phone, role)
        VALUES ($1, $2, $3, 'client')
        ON CONFLICT (email) DO UPDATE SET updated_at = app_user.updated_at
        RETURNING id
        ",
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .fetch_one(conn)
    .await?;

    Ok(UserId::new(id))
}
