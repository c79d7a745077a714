//! Customer repository (back-office view).

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

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, phone, role, created_at
            FROM app_user
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Find a customer by email or create a client account for them.
///
/// Runs on the caller's connection so it can join an order transaction.
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
