//! Database migration command.
//!
//! Applies the SQL files in `migrations/` (or `--dir`) in version order.
//! Already applied migrations are skipped; a changed checksum aborts.

use std::path::Path;

use sqlx::migrate::{MigrateError, Migrator};
use thiserror::Error;

use super::CommandError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, the database is not
/// reachable, or a migration fails.
pub async fn run(dir: &Path) -> Result<(), MigrationError> {
    let migrator = Migrator::new(dir).await?;
    tracing::info!(
        dir = %dir.display(),
        count = migrator.iter().count(),
        "Loaded migrations"
    );

    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    migrator.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
