//! Notification repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use acsess_core::{NotificationId, NotificationKind};

use super::RepositoryError;
use crate::models::Notification;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i32,
    title: String,
    message: String,
    kind: NotificationKind,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            title: row.title,
            message: row.message,
            kind: row.kind,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Unread notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_unread(&self) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"
            SELECT id, title, message, kind, is_read, created_at
            FROM notification
            WHERE NOT is_read
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> Result<NotificationId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO notification (title, message, kind) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(title)
        .bind(message)
        .bind(kind)
        .fetch_one(self.pool)
        .await?;
        Ok(NotificationId::new(id))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the notification does not exist.
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE notification SET is_read = true WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark everything read. Returns how many rows changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_all_read(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE notification SET is_read = true WHERE NOT is_read")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
