//! Phone-code step of the admin login.

use chrono::Utc;

use acsess_core::{PhoneNumber, TwoFactorSessionId};

use super::{AdminAuthError, AdminAuthService, TokenService};
use crate::config::TelegramConfig;
use crate::db::{RepositoryError, SettingsRepository};
use crate::models::{
    CodeCheck, MAX_RESENDS, MAX_VERIFY_ATTEMPTS, RESEND_COOLDOWN, ResendDenied, TwoFactorSession,
    expiry_from, generate_code,
};
use crate::telegram::{CodeChannel, Delivered};

/// What code delivery needs besides the database.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryContext<'a> {
    pub http: &'a reqwest::Client,
    pub telegram: &'a TelegramConfig,
}

/// A code was stored and delivered.
#[derive(Debug, Clone)]
pub struct CodeSent {
    pub session_id: TwoFactorSessionId,
    pub phone: PhoneNumber,
    pub delivered: Delivered,
}

/// A code was accepted and a token issued.
#[derive(Debug, Clone)]
pub struct Verified {
    pub token: String,
    pub phone: String,
}

impl AdminAuthService<'_> {
    /// Re-check credentials, open a two-factor session and deliver its code.
    ///
    /// If delivery fails the session is removed again so no undeliverable
    /// code stays valid.
    ///
    /// # Errors
    ///
    /// Credential errors as in [`Self::validate_credentials`], `MissingField`
    /// or `InvalidPhone` for the phone, `Delivery` when the code cannot be sent.
    #[tracing::instrument(skip(self, password, ctx), fields(login = %login))]
    pub async fn send_code(
        &self,
        login: &str,
        password: &str,
        phone: &str,
        ctx: DeliveryContext<'_>,
    ) -> Result<CodeSent, AdminAuthError> {
        self.validate_credentials(login, password).await?;

        if phone.trim().is_empty() {
            return Err(AdminAuthError::MissingField("phoneNumber"));
        }
        let phone = PhoneNumber::parse(phone)?;

        let purged = self.sessions.delete_expired().await?;
        if purged > 0 {
            tracing::debug!(purged, "Removed expired two-factor sessions");
        }

        let code = generate_code();
        let session = self
            .sessions
            .create(phone.as_str(), &code, expiry_from(Utc::now()))
            .await?;

        match self.deliver(ctx, &code, &phone).await {
            Ok(delivered) => Ok(CodeSent {
                session_id: session.id,
                phone,
                delivered,
            }),
            Err(e) => {
                self.sessions.delete(session.id).await?;
                Err(e)
            }
        }
    }

    /// Check a submitted code and, when it matches, consume the session and
    /// issue an admin token.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `SessionExpired` (session deleted), `InvalidCode`
    /// (attempt recorded), or `TooManyAttempts` (session deleted).
    #[tracing::instrument(skip(self, code, tokens))]
    pub async fn verify_code(
        &self,
        session_id: &str,
        code: &str,
        tokens: &TokenService,
    ) -> Result<Verified, AdminAuthError> {
        let id = parse_session_id(session_id)?;
        if code.trim().is_empty() {
            return Err(AdminAuthError::MissingField("code"));
        }

        let session = self.find_session(id).await?;

        match session.check(code, Utc::now()) {
            CodeCheck::Expired => {
                self.sessions.delete(id).await?;
                tracing::info!("Expired two-factor session rejected and removed");
                Err(AdminAuthError::SessionExpired)
            }
            CodeCheck::Valid => {
                let Some(consumed) = self.sessions.consume(id, code.trim()).await? else {
                    // Lost a race with another request, or expired in between.
                    return Err(self.gone(id).await?);
                };
                let token = tokens.issue(&consumed.phone)?;
                tracing::info!(phone = %mask(&consumed.phone), "Admin signed in");
                Ok(Verified {
                    token,
                    phone: consumed.phone,
                })
            }
            CodeCheck::Mismatch { .. } | CodeCheck::Exhausted => {
                let attempts = match self.sessions.record_failed_attempt(id).await {
                    Ok(attempts) => attempts,
                    Err(RepositoryError::NotFound) => return Err(AdminAuthError::SessionNotFound),
                    Err(e) => return Err(e.into()),
                };
                if attempts >= MAX_VERIFY_ATTEMPTS {
                    self.sessions.delete(id).await?;
                    tracing::warn!(attempts, "Two-factor session locked after failed attempts");
                    return Err(AdminAuthError::TooManyAttempts);
                }
                Err(AdminAuthError::InvalidCode {
                    attempts_left: MAX_VERIFY_ATTEMPTS - attempts,
                })
            }
        }
    }

    /// Generate a fresh code for an existing session and deliver it.
    ///
    /// Works on expired sessions too; the new code gets a new expiry.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `ResendCooldown`, `ResendLimit`, or `Delivery`.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn resend_code(
        &self,
        session_id: &str,
        ctx: DeliveryContext<'_>,
    ) -> Result<CodeSent, AdminAuthError> {
        let id = parse_session_id(session_id)?;

        let code = generate_code();
        let regenerated = self
            .sessions
            .regenerate(id, &code, expiry_from(Utc::now()), MAX_RESENDS, RESEND_COOLDOWN)
            .await?;
        let Some(session) = regenerated else {
            return Err(self.resend_refused(id).await?);
        };
        let phone = PhoneNumber::parse(&session.phone)?;

        let delivered = self.deliver(ctx, &code, &phone).await?;
        tracing::info!(resends = session.resend_count, "Login code resent");

        Ok(CodeSent {
            session_id: session.id,
            phone,
            delivered,
        })
    }

    /// Classify a resend the database refused.
    async fn resend_refused(
        &self,
        id: TwoFactorSessionId,
    ) -> Result<AdminAuthError, AdminAuthError> {
        let session = self.find_session(id).await?;
        Ok(match session.can_resend(Utc::now()) {
            Err(ResendDenied::LimitReached) => AdminAuthError::ResendLimit,
            Err(ResendDenied::Cooldown { retry_after_secs }) => {
                AdminAuthError::ResendCooldown { retry_after_secs }
            }
            // Application and database clocks disagree by a moment.
            Ok(()) => AdminAuthError::ResendCooldown {
                retry_after_secs: 1,
            },
        })
    }

    async fn find_session(
        &self,
        id: TwoFactorSessionId,
    ) -> Result<TwoFactorSession, AdminAuthError> {
        self.sessions
            .find(id)
            .await?
            .ok_or(AdminAuthError::SessionNotFound)
    }

    /// Classify a session that could not be consumed.
    async fn gone(&self, id: TwoFactorSessionId) -> Result<AdminAuthError, AdminAuthError> {
        match self.sessions.find(id).await? {
            Some(session) if session.is_expired(Utc::now()) => {
                self.sessions.delete(id).await?;
                Ok(AdminAuthError::SessionExpired)
            }
            _ => Ok(AdminAuthError::SessionNotFound),
        }
    }

    async fn deliver(
        &self,
        ctx: DeliveryContext<'_>,
        code: &str,
        phone: &PhoneNumber,
    ) -> Result<Delivered, AdminAuthError> {
        let settings = SettingsRepository::new(self.pool).load_site().await?;
        let channel = CodeChannel::resolve(ctx.http, ctx.telegram, &settings);

        channel.deliver(code, &phone.masked()).await.map_err(|e| {
            tracing::error!(error = %e, phone = %phone.masked(), "Login code delivery failed");
            AdminAuthError::Delivery(e)
        })
    }
}

fn parse_session_id(raw: &str) -> Result<TwoFactorSessionId, AdminAuthError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AdminAuthError::MissingField("sessionId"));
    }
    raw.parse()
        .map_err(|_| AdminAuthError::SessionNotFound)
}

fn mask(phone: &str) -> String {
    PhoneNumber::parse(phone).map_or_else(|_| "***".to_string(), |p| p.masked())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_id() {
        assert!(matches!(
            parse_session_id("  "),
            Err(AdminAuthError::MissingField("sessionId"))
        ));
        assert!(matches!(
            parse_session_id("not-a-uuid"),
            Err(AdminAuthError::SessionNotFound)
        ));
        let id = TwoFactorSessionId::generate();
        assert!(matches!(parse_session_id(&id.to_string()), Ok(parsed) if parsed == id));
    }

    #[test]
    fn test_mask_falls_back_for_garbage() {
        assert_eq!(mask("abc"), "***");
        assert!(mask("+79001234567").ends_with("4567"));
    }
}
