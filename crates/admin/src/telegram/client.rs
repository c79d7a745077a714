//! Telegram Bot API client.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use super::error::TelegramError;
use super::types::{ApiResponse, BotUser, SendMessage, SentMessage};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Minimal Bot API client: token check and plain messages.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    bot_token: SecretString,
    api_base: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("bot_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    #[must_use]
    pub fn new(client: Client, bot_token: SecretString) -> Self {
        Self {
            client,
            bot_token,
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    /// Point the client at another API host (local Bot API server, tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Check the token by asking who the bot is.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<BotUser, TelegramError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let bot: BotUser = unwrap_response(response).await?;
        debug!(username = ?bot.username, "Telegram bot token verified");
        Ok(bot)
    }

    /// Send an HTML-formatted message.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram rejects the message.
    #[instrument(skip(self, text))]
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
    ) -> Result<SentMessage, TelegramError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let sent: SentMessage = unwrap_response(response).await?;
        debug!(message_id = sent.message_id, "Telegram message sent");
        Ok(sent)
    }
}

/// Decode the Bot API envelope, turning `ok: false` into an error.
async fn unwrap_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TelegramError> {
    let envelope: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| TelegramError::Response(e.without_url().to_string()))?;

    match envelope {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse {
            error_code,
            description,
            ..
        } => {
            let code = error_code.unwrap_or_default();
            let description = description.unwrap_or_else(|| "Unknown error".to_string());
            error!(code, description = %description, "Telegram API error");
            Err(TelegramError::Api { code, description })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = TelegramClient::new(Client::new(), SecretString::from("123:very-private"));
        let out = format!("{client:?}");
        assert!(!out.contains("very-private"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new(Client::new(), SecretString::from("123:abc"))
            .with_api_base("http://localhost:8081/");
        assert_eq!(client.method_url("getMe"), "http://localhost:8081/bot123:abc/getMe");
    }

    #[test]
    fn test_envelope_error_shape() {
        let json = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        let parsed: ApiResponse<SentMessage> = serde_json::from_str(json).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.error_code, Some(400));
        assert!(parsed.result.is_none());
    }
}
