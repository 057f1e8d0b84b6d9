//! Outbound message model.

use std::future::Future;
use std::path::PathBuf;

use teloxide::types::ChatId;

use super::GatewayError;

/// Callback data carried by the "Buy Premium" button.
pub const BUY_PREMIUM_CALLBACK: &str = "buy_premium";

/// Label of the "Buy Premium" button.
pub const BUY_PREMIUM_LABEL: &str = "💎 Buy Premium";

/// A message the bot sends back to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text.
    Text(String),

    /// Plain text with the "Buy Premium" button attached.
    WithUpsell(String),

    /// Text formatted as `MarkdownV2`.
    Markdown(String),

    /// A video sent by its direct address.
    Video(String),

    /// A local image with a `MarkdownV2` caption.
    Photo { image: PathBuf, caption: String },
}

/// Anything that can deliver a [`Reply`] to a chat.
pub trait Gateway: Send + Sync {
    /// Sends one reply.
    fn send(&self, chat: ChatId, reply: Reply) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
