//! Telegram Bot API plumbing.
//!
//! Outbound messages are described by [`Reply`] and sent through a
//! [`Gateway`]; [`TelegramGateway`] is the Bot API implementation and
//! [`schema`] wires inbound updates to the command handler.

mod client;
mod dispatch;
mod reply;

pub use client::{GatewayError, TelegramGateway};
pub use dispatch::{HandlerResult, schema};
pub use reply::{BUY_PREMIUM_CALLBACK, BUY_PREMIUM_LABEL, Gateway, Reply};
