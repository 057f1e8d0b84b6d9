//! Application settings and Telegram configuration.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use teloxide::types::UserId;

use super::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FREE_COOLDOWN_HOURS, DEFAULT_LINK_MARKER,
    MAX_FREE_COOLDOWN_HOURS,
};

/// Shape of a token issued by `@BotFather`: numeric bot id, colon, secret.
const TOKEN_PATTERN: &str = r"^\d{6,20}:[A-Za-z0-9_-]{35,}$";

static TOKEN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(TOKEN_PATTERN).ok());

/// Telegram credentials and the admin identity.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API token.
    pub token: String,

    /// The only account allowed to grant premium access.
    pub admin_id: UserId,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub const fn new(token: String, admin_id: UserId) -> Self {
        Self { token, admin_id }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` and `ADMIN_USER_ID` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("BOT_TOKEN")
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        if !looks_like_token(&token) {
            return Err(ConfigError::InvalidToken(mask_token(&token)));
        }

        let admin_id = lookup("ADMIN_USER_ID")
            .ok_or(ConfigError::MissingEnvVar("ADMIN_USER_ID"))?
            .trim()
            .parse()
            .map(UserId)
            .map_err(|_| ConfigError::InvalidAdminId)?;

        Ok(Self { token, admin_id })
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &mask_token(&self.token))
            .field("admin_id", &self.admin_id)
            .finish()
    }
}

/// Checks that a string has the shape of a Bot API token.
#[must_use]
pub fn looks_like_token(token: &str) -> bool {
    TOKEN_RE
        .as_ref()
        .is_some_and(|re| re.is_match(token.trim()))
}

/// Keeps the bot id and hides the secret part of a token.
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) => format!("{id}:***"),
        None => "***".to_owned(),
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Payment identifier shown with the premium plans.
    pub payment_id: String,

    /// Path to the payment QR image.
    #[serde(default = "default_qr_image_path")]
    pub qr_image_path: PathBuf,

    /// Path to the premium entitlement file.
    #[serde(default = "default_premium_path")]
    pub premium_path: PathBuf,

    /// Path to the free-tier usage file.
    #[serde(default = "default_usage_path")]
    pub usage_path: PathBuf,

    /// Case-insensitive marker a message must contain to count as a link.
    #[serde(default = "default_link_marker")]
    pub link_marker: String,

    /// Bounded wait for the page fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Free-tier cooldown, in hours.
    #[serde(default = "default_free_cooldown")]
    pub free_cooldown_hours: i64,
}

fn default_qr_image_path() -> PathBuf {
    PathBuf::from("qr.png")
}

fn default_premium_path() -> PathBuf {
    PathBuf::from("premium_users.json")
}

fn default_usage_path() -> PathBuf {
    PathBuf::from("usage_tracker.json")
}

fn default_link_marker() -> String {
    DEFAULT_LINK_MARKER.to_owned()
}

const fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

const fn default_free_cooldown() -> i64 {
    DEFAULT_FREE_COOLDOWN_HOURS
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            payment_id: String::new(),
            qr_image_path: default_qr_image_path(),
            premium_path: default_premium_path(),
            usage_path: default_usage_path(),
            link_marker: default_link_marker(),
            fetch_timeout_secs: default_fetch_timeout(),
            free_cooldown_hours: default_free_cooldown(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables.
    ///
    /// Only `PAYMENT_ID` is required, everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates bot settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let payment_id = lookup("PAYMENT_ID")
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("PAYMENT_ID"))?;

        let link_marker = lookup("LINK_MARKER")
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(default_link_marker);

        Ok(Self {
            payment_id,
            qr_image_path: lookup("QR_IMAGE_PATH").map_or_else(default_qr_image_path, PathBuf::from),
            premium_path: lookup("PREMIUM_FILE").map_or_else(default_premium_path, PathBuf::from),
            usage_path: lookup("USAGE_FILE").map_or_else(default_usage_path, PathBuf::from),
            link_marker,
            fetch_timeout_secs: lookup("FETCH_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or_else(default_fetch_timeout),
            free_cooldown_hours: lookup("FREE_COOLDOWN_HOURS")
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|hours| (1..=MAX_FREE_COOLDOWN_HOURS).contains(hours))
                .unwrap_or_else(default_free_cooldown),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("BOT_TOKEN format invalid ({0}). Check the token from @BotFather.")]
    InvalidToken(String),

    #[error("Invalid ADMIN_USER_ID (must be a positive integer)")]
    InvalidAdminId,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const TOKEN: &str = "123456789:ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijk";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_token_pattern_compiles() {
        assert!(TOKEN_RE.is_some());
    }

    #[test]
    fn test_looks_like_token() {
        assert!(looks_like_token(TOKEN));
        assert!(looks_like_token(&format!("  {TOKEN}\n")));
        assert!(!looks_like_token("12345:short"));
        assert!(!looks_like_token("not-a-token"));
        assert!(!looks_like_token(""));
    }

    #[test]
    fn test_telegram_config_from_lookup() {
        let config =
            TelegramConfig::from_lookup(lookup(&[("BOT_TOKEN", TOKEN), ("ADMIN_USER_ID", "42")]))
                .unwrap();
        assert_eq!(config.token, TOKEN);
        assert_eq!(config.admin_id, UserId(42));
    }

    #[test]
    fn test_telegram_config_missing_token() {
        let err = TelegramConfig::from_lookup(lookup(&[("ADMIN_USER_ID", "42")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("BOT_TOKEN")));
    }

    #[test]
    fn test_telegram_config_bad_token_is_masked() {
        let err = TelegramConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "123456789:tooshort"),
            ("ADMIN_USER_ID", "42"),
        ]))
        .unwrap_err();
        assert!(matches!(&err, ConfigError::InvalidToken(masked) if masked == "123456789:***"));
        assert!(!err.to_string().contains("tooshort"));
    }

    #[test]
    fn test_telegram_config_bad_admin_id() {
        let err = TelegramConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", TOKEN),
            ("ADMIN_USER_ID", "-5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAdminId));
    }

    #[test]
    fn test_debug_hides_token() {
        let config = TelegramConfig::new(TOKEN.to_owned(), UserId(1));
        let debug = format!("{config:?}");
        assert!(debug.contains("123456789:***"));
        assert!(!debug.contains("ABCDEF"));
    }

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.link_marker, "diskwala");
        assert_eq!(settings.fetch_timeout_secs, 20);
        assert_eq!(settings.free_cooldown_hours, 24);
        assert_eq!(settings.premium_path, PathBuf::from("premium_users.json"));
        assert_eq!(settings.usage_path, PathBuf::from("usage_tracker.json"));
        assert_eq!(settings.qr_image_path, PathBuf::from("qr.png"));
    }

    #[test]
    fn test_settings_require_payment_id() {
        let err = BotSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("PAYMENT_ID")));
    }

    #[test]
    fn test_settings_overrides_and_fallbacks() {
        let settings = BotSettings::from_lookup(lookup(&[
            ("PAYMENT_ID", "shop@upi"),
            ("LINK_MARKER", " DiskWala "),
            ("USAGE_FILE", "/tmp/usage.json"),
            ("FETCH_TIMEOUT_SECS", "abc"),
            ("FREE_COOLDOWN_HOURS", "12"),
        ]))
        .unwrap();
        assert_eq!(settings.payment_id, "shop@upi");
        assert_eq!(settings.link_marker, "diskwala");
        assert_eq!(settings.usage_path, PathBuf::from("/tmp/usage.json"));
        assert_eq!(settings.fetch_timeout_secs, 20);
        assert_eq!(settings.free_cooldown_hours, 12);
    }

    #[test]
    fn test_settings_reject_out_of_range_cooldown() {
        for raw in ["0", "-3", "10000000000"] {
            let settings =
                BotSettings::from_lookup(lookup(&[("PAYMENT_ID", "p"), ("FREE_COOLDOWN_HOURS", raw)]))
                    .unwrap();
            assert_eq!(settings.free_cooldown_hours, 24, "FREE_COOLDOWN_HOURS={raw}");
        }
    }
}
