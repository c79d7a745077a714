//! Telegram delivery of one-time login codes.
//!
//! The bot token and chat id come from the environment when set, otherwise
//! from the secure settings rows. Without a real token delivery degrades to
//! writing the code to the log so a fresh install can still sign in.

mod client;
mod error;
mod types;

use secrecy::{ExposeSecret, SecretString};

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::{BotUser, SentMessage};

use crate::config::TelegramConfig;
use crate::models::SiteSettings;

/// Token values shipped in sample data that must never be sent to the API.
const PLACEHOLDER_TOKENS: &[&str] = &[
    "DEMO_BOT_TOKEN",
    "YOUR_BOT_TOKEN_HERE",
    "YOUR_REAL_TOKEN_HERE",
];

/// How a code will reach the administrator.
#[derive(Debug)]
pub enum CodeChannel {
    /// No usable token: the code is logged.
    Log,
    /// Delivered by the bot to a chat.
    Telegram {
        client: TelegramClient,
        chat_id: String,
    },
    /// Token present but delivery cannot work.
    Misconfigured(TelegramError),
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivered {
    Logged,
    Telegram,
}

impl CodeChannel {
    /// Pick the channel from environment overrides and stored settings.
    #[must_use]
    pub fn resolve(http: &reqwest::Client, env: &TelegramConfig, settings: &SiteSettings) -> Self {
        let token = env
            .bot_token
            .as_ref()
            .map(|t| t.expose_secret().trim().to_string())
            .unwrap_or_else(|| settings.telegram_bot_token.trim().to_string());

        if is_placeholder_token(&token) {
            return Self::Log;
        }

        let chat_id = env
            .chat_id
            .clone()
            .unwrap_or_else(|| settings.telegram_chat_id.clone());
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return Self::Misconfigured(TelegramError::MissingChatId);
        }

        Self::Telegram {
            client: TelegramClient::new(http.clone(), SecretString::from(token)),
            chat_id: chat_id.to_string(),
        }
    }

    /// Deliver `code` for a login from `masked_phone`.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel is misconfigured, the token is
    /// rejected by `getMe`, or `sendMessage` fails.
    pub async fn deliver(self, code: &str, masked_phone: &str) -> Result<Delivered, TelegramError> {
        match self {
            Self::Log => {
                tracing::warn!(
                    code = %code,
                    phone = %masked_phone,
                    "Telegram bot token not configured; login code written to log"
                );
                Ok(Delivered::Logged)
            }
            Self::Misconfigured(err) => Err(err),
            Self::Telegram { client, chat_id } => {
                client.get_me().await?;
                client
                    .send_message(&chat_id, &code_message(code, masked_phone))
                    .await?;
                tracing::info!(phone = %masked_phone, "Login code delivered via Telegram");
                Ok(Delivered::Telegram)
            }
        }
    }
}

/// Whether a token is absent or one of the sample placeholders.
#[must_use]
pub fn is_placeholder_token(token: &str) -> bool {
    let token = token.trim();
    token.is_empty() || PLACEHOLDER_TOKENS.iter().any(|p| token.eq_ignore_ascii_case(p))
}

/// Text of the code message.
#[must_use]
pub fn code_message(code: &str, masked_phone: &str) -> String {
    format!(
        "🔐 Код для входа в админ-панель: <b>{code}</b>\n\
         Телефон: {masked_phone}\n\n\
         Код действителен 5 минут."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_tokens() {
        assert!(is_placeholder_token(""));
        assert!(is_placeholder_token("  "));
        assert!(is_placeholder_token("DEMO_BOT_TOKEN"));
        assert!(is_placeholder_token("your_bot_token_here"));
        assert!(!is_placeholder_token("123456:AAH-real-looking"));
    }

    #[test]
    fn test_resolve_without_token_logs() {
        let channel = CodeChannel::resolve(
            &reqwest::Client::new(),
            &TelegramConfig::default(),
            &SiteSettings::default(),
        );
        assert!(matches!(channel, CodeChannel::Log));
    }

    #[test]
    fn test_resolve_token_without_chat_is_misconfigured() {
        let settings = SiteSettings {
            telegram_bot_token: "123456:AAH-real".to_string(),
            ..SiteSettings::default()
        };
        let channel =
            CodeChannel::resolve(&reqwest::Client::new(), &TelegramConfig::default(), &settings);
        assert!(matches!(
            channel,
            CodeChannel::Misconfigured(TelegramError::MissingChatId)
        ));
    }

    #[test]
    fn test_env_overrides_settings() {
        let settings = SiteSettings {
            telegram_bot_token: "DEMO_BOT_TOKEN".to_string(),
            telegram_chat_id: "1".to_string(),
            ..SiteSettings::default()
        };
        let env = TelegramConfig {
            bot_token: Some(SecretString::from("123456:AAH-real")),
            chat_id: Some("42".to_string()),
        };
        match CodeChannel::resolve(&reqwest::Client::new(), &env, &settings) {
            CodeChannel::Telegram { chat_id, .. } => assert_eq!(chat_id, "42"),
            other => panic!("unexpected channel: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_log_channel_always_delivers() {
        let delivered = CodeChannel::Log.deliver("123456", "****4567").await;
        assert!(matches!(delivered, Ok(Delivered::Logged)));
    }

    #[test]
    fn test_code_message_mentions_code() {
        let text = code_message("654321", "*******4567");
        assert!(text.contains("<b>654321</b>"));
        assert!(text.contains("4567"));
    }
}
