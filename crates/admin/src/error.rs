//! Unified error handling for admin.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"error": "..."}`; server-side failures are captured to Sentry and their
//! details are not sent to the client.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AdminAuthError;
use crate::services::import::ImportError;
use crate::services::storage::StorageError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Login flow failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Image upload failed validation or storage.
    #[error("Upload error: {0}")]
    Storage(#[from] StorageError),

    /// Spreadsheet could not be read.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) | Self::Auth(AdminAuthError::Repository(err)) => {
                repository_status(err)
            }
            Self::Auth(err) => auth_status(err),
            Self::Storage(err) => match err {
                StorageError::UnsupportedType(_) | StorageError::TooLarge(_) | StorageError::Empty => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Import(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Database(err) | Self::Auth(AdminAuthError::Repository(err)) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AdminAuthError::InvalidCredentials => "Invalid login or password".to_string(),
                AdminAuthError::NotConfigured => {
                    "Admin account is not configured. Create one with the CLI.".to_string()
                }
                AdminAuthError::Delivery(_) => {
                    "Failed to send the code. Check the Telegram bot settings.".to_string()
                }
                AdminAuthError::PasswordHash | AdminAuthError::Token(_) => {
                    "Internal server error".to_string()
                }
                other => capitalize(&other.to_string()),
            },
            Self::Storage(err) => match err {
                StorageError::UnsupportedType(_) | StorageError::TooLarge(_) | StorageError::Empty => {
                    err.to_string()
                }
                _ => "Image upload failed".to_string(),
            },
            Self::Import(err) => err.to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
        }
    }

    const fn retry_after(&self) -> Option<i64> {
        match self {
            Self::Auth(AdminAuthError::ResendCooldown { retry_after_secs }) => {
                Some(*retry_after_secs)
            }
            _ => None,
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

const fn auth_status(err: &AdminAuthError) -> StatusCode {
    match err {
        AdminAuthError::MissingField(_)
        | AdminAuthError::InvalidPhone(_)
        | AdminAuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
        AdminAuthError::InvalidCredentials | AdminAuthError::InvalidCode { .. } => {
            StatusCode::UNAUTHORIZED
        }
        AdminAuthError::SessionNotFound => StatusCode::NOT_FOUND,
        AdminAuthError::SessionExpired => StatusCode::GONE,
        AdminAuthError::TooManyAttempts
        | AdminAuthError::ResendCooldown { .. }
        | AdminAuthError::ResendLimit => StatusCode::TOO_MANY_REQUESTS,
        AdminAuthError::Delivery(_) => StatusCode::BAD_GATEWAY,
        AdminAuthError::NotConfigured
        | AdminAuthError::PasswordHash
        | AdminAuthError::Token(_)
        | AdminAuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let body = ErrorBody {
            error: self.client_message(),
        };
        let mut response = (status, Json(body)).into_response();

        if let Some(secs) = self.retry_after()
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Tag Sentry events with the phone the admin signed in with.
pub fn set_sentry_admin(masked_phone: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some("admin".to_string()),
            username: Some(masked_phone.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            status(AdminAuthError::MissingField("login").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AdminAuthError::NotConfigured.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AdminAuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AdminAuthError::SessionNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(AdminAuthError::SessionExpired.into()), StatusCode::GONE);
        assert_eq!(
            status(AdminAuthError::InvalidCode { attempts_left: 2 }.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AdminAuthError::TooManyAttempts.into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status(AdminAuthError::ResendLimit.into()),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_cooldown_sets_retry_after() {
        let response =
            AppError::from(AdminAuthError::ResendCooldown { retry_after_secs: 17 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "17");
    }

    #[test]
    fn test_repository_mapping() {
        assert_eq!(
            status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(RepositoryError::Conflict("login already exists".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AdminAuthError::Repository(RepositoryError::Conflict("x".into())).into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("connection string leaked".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        let err = AppError::Database(RepositoryError::DataCorruption("bad row".into()));
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_auth_messages() {
        let err = AppError::from(AdminAuthError::InvalidCode { attempts_left: 3 });
        assert_eq!(err.client_message(), "Invalid code, 3 attempt(s) left");
        let err = AppError::from(AdminAuthError::MissingField("phoneNumber"));
        assert_eq!(err.client_message(), "Missing required field: phoneNumber");
    }

    #[tokio::test]
    async fn test_body_is_json() {
        let response = AppError::NotFound("Product not found".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Product not found");
    }
}
