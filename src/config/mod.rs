//! Configuration module for the Diskwala bot.
//!
//! Handles loading and validation of the bot credential, the admin
//! identity, and the runtime settings (state file paths, payment details,
//! scraping and rate-limit knobs).

mod settings;

pub use settings::{BotSettings, ConfigError, TelegramConfig, looks_like_token};

/// Substring a message must contain to be treated as a supported link.
pub const DEFAULT_LINK_MARKER: &str = "diskwala";

/// Length of the free-tier cooldown window in hours.
pub const DEFAULT_FREE_COOLDOWN_HOURS: i64 = 24;

/// Longest accepted free-tier cooldown in hours (ten years).
pub const MAX_FREE_COOLDOWN_HOURS: i64 = 24 * 366 * 10;

/// Upper bound on the page fetch in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
