//! Signed admin session tokens.
//!
//! After a successful code check the browser receives an HS256 JWT in the
//! `admin-token` cookie. The token is self-contained: the gate on
//! `/api/admin` only checks the signature and expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of an admin session.
pub const SESSION_TTL: Duration = Duration::hours(24);

const SUBJECT: &str = "admin";

/// Claims carried by the admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    /// Phone the code was delivered for
    pub phone: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Issues and checks admin tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a token for a verified phone.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue(&self, phone: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: SUBJECT.to_string(),
            phone: phone.to_string(),
            iat: now.timestamp(),
            exp: (now + SESSION_TTL).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &AdminClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature, expiry and subject.
    ///
    /// # Errors
    ///
    /// Returns the reason the token is not acceptable.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.sub = Some(SUBJECT.to_string());

        let data = decode::<AdminClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => {
                    tracing::warn!("Admin token with invalid signature");
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            }
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret))
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = service("kq3Z8vX2pL9mW4nR7tY1bC6dF0gH5jSe");
        let token = svc.issue("+79001234567").unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.phone, "+79001234567");
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL.num_seconds());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = service("first-key-0123456789abcdefghijkl").issue("+7900").unwrap();
        let err = service("other-key-0123456789abcdefghijkl").verify(&token).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn test_expired_rejected() {
        let svc = service("kq3Z8vX2pL9mW4nR7tY1bC6dF0gH5jSe");
        let past = Utc::now() - Duration::hours(25);
        let token = svc
            .sign(&AdminClaims {
                sub: SUBJECT.to_string(),
                phone: "+79001234567".to_string(),
                iat: past.timestamp(),
                exp: (past + SESSION_TTL).timestamp(),
            })
            .unwrap();
        assert_eq!(svc.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_garbage_rejected() {
        let svc = service("kq3Z8vX2pL9mW4nR7tY1bC6dF0gH5jSe");
        assert_eq!(svc.verify("not.a.token").unwrap_err(), TokenError::Malformed);
    }
}
