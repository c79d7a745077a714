//! Pending two-factor logins.
//!
//! A session is created after the login/password check succeeds and lives
//! until the code is verified, it expires, or it runs out of attempts.
//! The decision logic lives here so it can be tested without a database.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use acsess_core::TwoFactorSessionId;

/// How long a delivered code stays valid.
pub const CODE_TTL: Duration = Duration::minutes(5);
/// Wrong codes tolerated before the session is destroyed.
pub const MAX_VERIFY_ATTEMPTS: i32 = 5;
/// Minimum gap between two deliveries for the same session.
pub const RESEND_COOLDOWN: Duration = Duration::seconds(30);
/// Redeliveries allowed per session.
pub const MAX_RESENDS: i32 = 5;

/// A stored two-factor session.
#[derive(Debug, Clone)]
pub struct TwoFactorSession {
    pub id: TwoFactorSessionId,
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub resend_count: i32,
    pub last_sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of comparing a submitted code with a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// Code matches and the session is still live.
    Valid,
    /// The session is past its expiry; the code was not looked at.
    Expired,
    /// Wrong code; `attempts_left` more tries before lockout.
    Mismatch { attempts_left: i32 },
    /// Wrong code and no attempts left.
    Exhausted,
}

/// Why a resend was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendDenied {
    Cooldown { retry_after_secs: i64 },
    LimitReached,
}

impl TwoFactorSession {
    /// Whether the session is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Compare `submitted` with the stored code.
    ///
    /// Expiry is checked first so an expired session always fails closed,
    /// even with the right code.
    #[must_use]
    pub fn check(&self, submitted: &str, now: DateTime<Utc>) -> CodeCheck {
        if self.is_expired(now) {
            return CodeCheck::Expired;
        }
        if codes_match(&self.code, submitted.trim()) {
            return CodeCheck::Valid;
        }
        let attempts_left = MAX_VERIFY_ATTEMPTS - (self.attempts + 1);
        if attempts_left <= 0 {
            CodeCheck::Exhausted
        } else {
            CodeCheck::Mismatch { attempts_left }
        }
    }

    /// Whether another delivery may be sent at `now`.
    ///
    /// # Errors
    ///
    /// Returns the reason when the cooldown has not elapsed or the resend
    /// budget is spent.
    pub fn can_resend(&self, now: DateTime<Utc>) -> Result<(), ResendDenied> {
        if self.resend_count >= MAX_RESENDS {
            return Err(ResendDenied::LimitReached);
        }
        let next_allowed = self.last_sent_at + RESEND_COOLDOWN;
        if now < next_allowed {
            let wait = (next_allowed - now).num_seconds().max(1);
            return Err(ResendDenied::Cooldown {
                retry_after_secs: wait,
            });
        }
        Ok(())
    }
}

/// Generate a random 6-digit code (100000-999999).
#[must_use]
pub fn generate_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Expiry for a code issued at `now`.
#[must_use]
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + CODE_TTL
}

/// Length-checked comparison that does not short-circuit on the first
/// differing byte.
fn codes_match(expected: &str, submitted: &str) -> bool {
    let (a, b) = (expected.as_bytes(), submitted.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>) -> TwoFactorSession {
        TwoFactorSession {
            id: TwoFactorSessionId::generate(),
            phone: "+79001234567".to_string(),
            code: "483920".to_string(),
            expires_at: expiry_from(now),
            attempts: 0,
            resend_count: 0,
            last_sent_at: now,
            created_at: now,
        }
    }

    #[test]
    fn test_generate_code_is_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap_or(0);
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn test_valid_code() {
        let now = Utc::now();
        let s = session(now);
        assert_eq!(s.check("483920", now), CodeCheck::Valid);
        assert_eq!(s.check(" 483920 ", now), CodeCheck::Valid);
    }

    #[test]
    fn test_expired_session_fails_even_with_right_code() {
        let now = Utc::now();
        let s = session(now);
        let later = now + CODE_TTL;
        assert!(s.is_expired(later));
        assert_eq!(s.check("483920", later), CodeCheck::Expired);
        assert_eq!(s.check("000000", later + Duration::hours(1)), CodeCheck::Expired);
    }

    #[test]
    fn test_still_valid_just_before_expiry() {
        let now = Utc::now();
        let s = session(now);
        let almost = now + CODE_TTL - Duration::seconds(1);
        assert_eq!(s.check("483920", almost), CodeCheck::Valid);
    }

    #[test]
    fn test_mismatch_counts_down_to_exhausted() {
        let now = Utc::now();
        let mut s = session(now);
        assert_eq!(
            s.check("111111", now),
            CodeCheck::Mismatch { attempts_left: 4 }
        );
        s.attempts = MAX_VERIFY_ATTEMPTS - 1;
        assert_eq!(s.check("111111", now), CodeCheck::Exhausted);
        assert_eq!(s.check("48392", now), CodeCheck::Exhausted);
    }

    #[test]
    fn test_resend_cooldown_and_limit() {
        let now = Utc::now();
        let mut s = session(now);
        assert_eq!(
            s.can_resend(now + Duration::seconds(10)),
            Err(ResendDenied::Cooldown {
                retry_after_secs: 20
            })
        );
        assert_eq!(s.can_resend(now + RESEND_COOLDOWN), Ok(()));
        s.resend_count = MAX_RESENDS;
        assert_eq!(
            s.can_resend(now + Duration::hours(1)),
            Err(ResendDenied::LimitReached)
        );
    }

    #[test]
    fn test_codes_match() {
        assert!(codes_match("123456", "123456"));
        assert!(!codes_match("123456", "123457"));
        assert!(!codes_match("123456", "1234567"));
        assert!(!codes_match("123456", ""));
    }
}
