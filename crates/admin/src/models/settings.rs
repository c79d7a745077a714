//! Site settings.
//!
//! Stored one key per row in the `setting` table so that individual values can
//! be flagged secure. In memory they are one typed struct with defaults for
//! every field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys whose rows are flagged `is_secure` and never served publicly.
pub const SECURE_KEYS: &[&str] = &["telegramBotToken", "telegramChatId"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub telegram: String,
    pub whatsapp: String,
    pub instagram: String,
    pub vk: String,
}

/// Everything editable on the settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub phone: String,
    pub email: String,
    pub address: String,
    pub social_links: SocialLinks,
    pub site_title: String,
    pub site_description: String,
    pub keywords: String,
    pub meta_description: String,
    pub logo_url: String,
    pub banner_url: String,
    pub welcome_text: String,
    pub about_text: String,
    pub email_notifications: bool,
    pub telegram_notifications: bool,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub notification_email: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            social_links: SocialLinks::default(),
            site_title: "Acsess Admin".to_string(),
            site_description: String::new(),
            keywords: String::new(),
            meta_description: String::new(),
            logo_url: String::new(),
            banner_url: String::new(),
            welcome_text: String::new(),
            about_text: String::new(),
            email_notifications: true,
            telegram_notifications: false,
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            notification_email: String::new(),
        }
    }
}

/// A single stored setting row.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingEntry {
    pub key: String,
    pub value: Value,
    pub is_secure: bool,
}

impl SiteSettings {
    /// Every key a settings row may use.
    #[must_use]
    pub fn keys() -> Vec<String> {
        match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Overlay stored rows onto the defaults.
    ///
    /// Rows that do not fit their field's type are skipped with a warning
    /// rather than discarding the whole settings object.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        for (key, value) in entries {
            if !merged.contains_key(&key) {
                continue;
            }
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value);
            if serde_json::from_value::<Self>(Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
            } else {
                tracing::warn!(key = %key, "Ignoring setting with unexpected type");
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or_default()
    }

    /// Rows to persist. Blank strings are omitted so the key falls back to
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the struct cannot be serialized.
    pub fn to_entries(&self) -> Result<Vec<SettingEntry>, serde_json::Error> {
        let Value::Object(map) = serde_json::to_value(self)? else {
            return Ok(Vec::new());
        };

        Ok(map
            .into_iter()
            .filter(|(_, value)| !matches!(value, Value::String(s) if s.trim().is_empty()))
            .map(|(key, value)| SettingEntry {
                is_secure: SECURE_KEYS.contains(&key.as_str()),
                key,
                value,
            })
            .collect())
    }

    /// Settings safe to show on the public site.
    #[must_use]
    pub fn public_view(&self) -> Map<String, Value> {
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for key in SECURE_KEYS {
            map.remove(*key);
        }
        map
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SiteSettings::default();
        assert_eq!(settings.site_title, "Acsess Admin");
        assert!(settings.email_notifications);
        assert!(!settings.telegram_notifications);
        assert!(SiteSettings::keys().contains(&"socialLinks".to_string()));
    }

    #[test]
    fn test_from_entries_overlays_and_skips_bad_rows() {
        let settings = SiteSettings::from_entries([
            ("phone".to_string(), json!("+7 900 000-00-00")),
            ("emailNotifications".to_string(), json!("not a bool")),
            ("socialLinks".to_string(), json!({"vk": "vk.com/acsess"})),
            ("unknown".to_string(), json!(1)),
        ]);
        assert_eq!(settings.phone, "+7 900 000-00-00");
        assert!(settings.email_notifications);
        assert_eq!(settings.social_links.vk, "vk.com/acsess");
        assert_eq!(settings.social_links.telegram, "");
    }

    #[test]
    fn test_to_entries_flags_secure_and_drops_blank() {
        let settings = SiteSettings {
            telegram_bot_token: "123:abc".to_string(),
            phone: "  ".to_string(),
            ..SiteSettings::default()
        };
        let entries = settings.to_entries().unwrap();
        let token = entries.iter().find(|e| e.key == "telegramBotToken").unwrap();
        assert!(token.is_secure);
        assert!(entries.iter().all(|e| e.key != "phone"));
        assert!(entries.iter().all(|e| e.key != "telegramChatId"));
        let title = entries.iter().find(|e| e.key == "siteTitle").unwrap();
        assert!(!title.is_secure);
    }

    #[test]
    fn test_public_view_hides_secure_keys() {
        let settings = SiteSettings {
            telegram_bot_token: "123:abc".to_string(),
            ..SiteSettings::default()
        };
        let view = settings.public_view();
        assert!(!view.contains_key("telegramBotToken"));
        assert!(!view.contains_key("telegramChatId"));
        assert_eq!(view.get("siteTitle"), Some(&json!("Acsess Admin")));
    }
}
