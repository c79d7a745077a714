//! Cleanup commands.

use acsess_admin::db::{RepositoryError, TwoFactorRepository};
use thiserror::Error;

use super::CommandError;

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Delete expired two-factor login sessions.
///
/// # Errors
///
/// Returns an error if the database is not reachable.
pub async fn sessions() -> Result<(), CleanupError> {
    let pool = super::connect().await?;
    let removed = TwoFactorRepository::new(&pool).delete_expired().await?;
    tracing::info!(removed, "Expired login sessions deleted");
    Ok(())
}
