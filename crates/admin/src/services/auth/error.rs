//! Admin authentication error types.

use thiserror::Error;

use acsess_core::PhoneError;

use super::token::TokenError;
use crate::db::RepositoryError;
use crate::telegram::TelegramError;

/// Errors that can occur during admin login and account management.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// A required request field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Phone number failed validation.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// No admin account exists yet.
    #[error("admin account is not configured")]
    NotConfigured,

    /// Login unknown or password mismatch.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// Unknown two-factor session.
    #[error("session not found")]
    SessionNotFound,

    /// The code's lifetime has passed.
    #[error("code expired, request a new one")]
    SessionExpired,

    /// Wrong code submitted.
    #[error("invalid code, {attempts_left} attempt(s) left")]
    InvalidCode { attempts_left: i32 },

    /// Too many wrong codes; the session was destroyed.
    #[error("too many failed attempts, start the login again")]
    TooManyAttempts,

    /// Resend requested before the cooldown elapsed.
    #[error("code was sent recently, retry in {retry_after_secs}s")]
    ResendCooldown { retry_after_secs: i64 },

    /// Resend budget spent.
    #[error("resend limit reached, start the login again")]
    ResendLimit,

    /// Code could not be delivered.
    #[error("failed to deliver code: {0}")]
    Delivery(#[from] TelegramError),

    /// Password too weak for a new account.
    #[error("{0}")]
    WeakPassword(String),

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Session token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
