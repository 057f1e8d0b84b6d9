//! Bot API gateway.

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, User};
use thiserror::Error;
use tracing::{debug, info};

use super::{BUY_PREMIUM_CALLBACK, BUY_PREMIUM_LABEL, Gateway, Reply};

/// Errors that can occur while talking to Telegram.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("Not a valid media address: {0}")]
    InvalidUrl(String),
}

/// Sends replies through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    /// Wraps an existing bot client.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Creates a bot client from a token.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        Self::new(Bot::new(token))
    }

    /// Confirms the token with Telegram and returns the bot account.
    pub async fn verify(&self) -> Result<User, GatewayError> {
        let me = self.bot.get_me().await?;
        info!(
            "Authorized as @{} (id {})",
            me.username.as_deref().unwrap_or("unknown"),
            me.id.0
        );
        Ok(me.user)
    }

    /// Returns the underlying bot client.
    #[must_use]
    pub const fn inner(&self) -> &Bot {
        &self.bot
    }
}

impl Gateway for TelegramGateway {
    async fn send(&self, chat: ChatId, reply: Reply) -> Result<(), GatewayError> {
        match reply {
            Reply::Text(text) => {
                debug!("Sending text to {}: \"{}\"", chat.0, truncate_for_log(&text, 40));
                self.bot.send_message(chat, text).await?;
            }
            Reply::WithUpsell(text) => {
                self.bot
                    .send_message(chat, text)
                    .reply_markup(buy_premium_keyboard())
                    .await?;
            }
            Reply::Markdown(text) => {
                self.bot
                    .send_message(chat, text)
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
            }
            Reply::Video(address) => {
                let url = reqwest::Url::parse(&address)
                    .map_err(|e| GatewayError::InvalidUrl(format!("{address}: {e}")))?;
                debug!("Sending video {} to {}", url, chat.0);
                self.bot.send_video(chat, InputFile::url(url)).await?;
            }
            Reply::Photo { image, caption } => {
                self.bot
                    .send_photo(chat, InputFile::file(image))
                    .caption(caption)
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Builds the single-button keyboard that opens the payment instructions.
#[must_use]
pub fn buy_premium_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        BUY_PREMIUM_LABEL,
        BUY_PREMIUM_CALLBACK,
    )]])
}

/// Truncates a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
