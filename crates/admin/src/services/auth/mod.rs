//! Admin authentication service.
//!
//! Login is two steps: login/password against an argon2 hash, then a 6-digit
//! code delivered through Telegram (see [`two_factor`]). A verified code is
//! exchanged for a signed token (see [`token`]).

mod error;
pub mod token;
mod two_factor;

pub use error::AdminAuthError;
pub use token::{AdminClaims, SESSION_TTL, TokenError, TokenService};
pub use two_factor::{CodeSent, DeliveryContext, Verified};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use crate::db::{AdminAccountRepository, TwoFactorRepository};
use crate::models::AdminAccount;

/// Minimum password length for new admin accounts.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    pool: &'a PgPool,
    accounts: AdminAccountRepository<'a>,
    sessions: TwoFactorRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            accounts: AdminAccountRepository::new(pool),
            sessions: TwoFactorRepository::new(pool),
        }
    }

    /// Check a login/password pair.
    ///
    /// # Errors
    ///
    /// - `MissingField` when either value is blank
    /// - `NotConfigured` when no admin account exists
    /// - `InvalidCredentials` when the login is unknown or the password is wrong
    pub async fn validate_credentials(
        &self,
        login: &str,
        password: &str,
    ) -> Result<(), AdminAuthError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AdminAuthError::MissingField("login"));
        }
        if password.is_empty() {
            return Err(AdminAuthError::MissingField("password"));
        }

        if self.accounts.count().await? == 0 {
            tracing::error!("Login attempted but no admin account exists");
            return Err(AdminAuthError::NotConfigured);
        }

        let Some(hash) = self.accounts.password_hash_for(login).await? else {
            tracing::info!(login = %login, "Login with unknown admin login");
            return Err(AdminAuthError::InvalidCredentials);
        };

        verify_password(password, &hash).inspect_err(|_| {
            tracing::info!(login = %login, "Admin password mismatch");
        })
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `WeakPassword` if the password is too short, or
    /// `Repository(Conflict)` if the login is taken.
    pub async fn create_account(
        &self,
        login: &str,
        password: &str,
        description: Option<&str>,
    ) -> Result<AdminAccount, AdminAuthError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AdminAuthError::MissingField("login"));
        }
        validate_password(password)?;
        let hash = hash_password(password)?;

        let account = self.accounts.create(login, &hash, description).await?;
        tracing::info!(login = %account.login, "Admin account created");
        Ok(account)
    }

    /// Replace the password of an existing account.
    ///
    /// # Errors
    ///
    /// Returns `WeakPassword` if the password is too short, or
    /// `Repository(NotFound)` if the login does not exist.
    pub async fn set_password(&self, login: &str, password: &str) -> Result<(), AdminAuthError> {
        validate_password(password)?;
        let hash = hash_password(password)?;
        self.accounts.set_password_hash(login.trim(), &hash).await?;
        tracing::info!(login = %login.trim(), "Admin password changed");
        Ok(())
    }
}

fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// An unparseable stored hash counts as a mismatch.
///
/// # Errors
///
/// Returns `AdminAuthError::InvalidCredentials` on mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| {
        tracing::error!("Stored admin password hash is not a valid PHC string");
        AdminAuthError::InvalidCredentials
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_plaintext_in_hash_column_never_matches() {
        assert!(matches!(
            verify_password("admin123", "admin123"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AdminAuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }
}
