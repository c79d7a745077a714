//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! acsess-cli admin create -l owner -p 'long password' -d "Shop owner"
//! acsess-cli admin set-password -l owner -p 'new long password'
//! ```

use acsess_admin::services::{AdminAuthError, AdminAuthService};
use thiserror::Error;

use super::CommandError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("{0}")]
    Auth(#[from] AdminAuthError),
}

/// Create a new admin account.
///
/// # Errors
///
/// Returns an error if the password is too short or the login is taken.
pub async fn create(
    login: &str,
    password: &str,
    description: Option<&str>,
) -> Result<(), AdminError> {
    let pool = super::connect().await?;

    let account = AdminAuthService::new(&pool)
        .create_account(login, password, description)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Login: {}",
        account.id,
        account.login
    );
    Ok(())
}

/// Replace an account's password.
///
/// # Errors
///
/// Returns an error if the password is too short or the login is unknown.
pub async fn set_password(login: &str, password: &str) -> Result<(), AdminError> {
    let pool = super::connect().await?;
    AdminAuthService::new(&pool)
        .set_password(login, password)
        .await?;
    tracing::info!(login, "Password updated");
    Ok(())
}
