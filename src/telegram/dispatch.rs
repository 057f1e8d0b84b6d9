//! Update routing.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::{debug, warn};

use super::{GatewayError, TelegramGateway};
use crate::commands::{BotHandler, Command};
use crate::resolver::MediaResolver;

/// Result type of every update endpoint.
pub type HandlerResult = Result<(), GatewayError>;

/// Builds the update handler tree.
///
/// Expects an `Arc<BotHandler<R>>` in the dispatcher dependencies.
pub fn schema<R: MediaResolver + 'static>() -> UpdateHandler<GatewayError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(on_command::<R>),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some_and(|t| !t.starts_with('/')))
                .endpoint(on_text::<R>),
        )
        .branch(Update::filter_callback_query().endpoint(on_callback::<R>))
}

async fn on_command<R: MediaResolver>(
    bot: Bot,
    msg: Message,
    cmd: Command,
    handler: Arc<BotHandler<R>>,
) -> HandlerResult {
    let gateway = TelegramGateway::new(bot);
    let chat = msg.chat.id;

    match cmd {
        Command::Start => handler.handle_start(&gateway, chat).await,
        Command::AddPremium(args) => {
            let Some(caller) = msg.from.as_ref().map(|u| u.id) else {
                debug!("Ignoring /addpremium without a sender");
                return Ok(());
            };
            handler
                .handle_add_premium(&gateway, chat, caller, &args)
                .await
                .map(|_| ())
        }
    }
}

async fn on_text<R: MediaResolver>(
    bot: Bot,
    msg: Message,
    handler: Arc<BotHandler<R>>,
) -> HandlerResult {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };

    let gateway = TelegramGateway::new(bot);
    let result = handler
        .handle_link(&gateway, msg.chat.id, user.id, text)
        .await;

    if let Err(e) = &result {
        warn!("Failed to answer link from user {}: {}", user.id.0, e);
    }
    result.map(|_| ())
}

async fn on_callback<R: MediaResolver>(
    bot: Bot,
    query: CallbackQuery,
    handler: Arc<BotHandler<R>>,
) -> HandlerResult {
    bot.answer_callback_query(query.id.clone()).await?;

    let chat = query
        .message
        .as_ref()
        .map_or_else(|| ChatId::from(query.from.id), |m| m.chat().id);

    let gateway = TelegramGateway::new(bot);
    handler
        .handle_callback(&gateway, chat, query.data.as_deref())
        .await
        .map(|_| ())
}
