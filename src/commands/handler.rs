//! Command handler implementation.

use teloxide::types::{ChatId, UserId};
use teloxide::utils::markdown;
use tracing::{debug, error, info, warn};

use super::types::{GrantOutcome, LinkOutcome, PremiumGrant};
use crate::config::{BotSettings, TelegramConfig};
use crate::resolver::MediaResolver;
use crate::store::{EntitlementStore, UsageTracker};
use crate::telegram::{BUY_PREMIUM_CALLBACK, Gateway, GatewayError, Reply};

const WELCOME: &str =
    "👋 Welcome! Send me a Diskwala link.\n\nFree = 1 video / 24 hrs.\nPremium = Unlimited!";
const NOT_A_LINK: &str = "❌ Please send a valid Diskwala link.";
const RATE_LIMITED: &str =
    "⚠️ Free users: 1 video every 24 hours. Upgrade to premium for unlimited access.";
const PROCESSING: &str = "🔄 Processing your link...";
const EXTRACTION_FAILED: &str = "❌ Failed to extract video from that link.";
const UNAUTHORIZED: &str = "❌ Unauthorized.";
const GRANT_USAGE: &str = "❌ Usage: /addpremium <user_id> <days>";
const GRANT_FAILED: &str = "❌ Error occurred.";

/// Premium plans shown with the payment instructions.
const PREMIUM_PLANS: &[(&str, &str)] = &[
    ("7 Days", "₹15"),
    ("30 Days", "₹60"),
    ("3 Months", "₹150"),
    ("Lifetime", "Contact Admin"),
];

/// Runs every user-facing flow of the bot.
///
/// The gateway is passed per call so the same handler serves the live bot
/// and in-memory gateways.
#[derive(Debug)]
pub struct BotHandler<R> {
    admin_id: UserId,
    settings: BotSettings,
    entitlements: EntitlementStore,
    usage: UsageTracker,
    resolver: R,
}

impl<R: MediaResolver> BotHandler<R> {
    /// Creates a handler with stores opened at the configured paths.
    #[must_use]
    pub fn new(telegram: &TelegramConfig, settings: BotSettings, resolver: R) -> Self {
        let entitlements = EntitlementStore::new(&settings.premium_path);
        let usage = UsageTracker::with_hours(&settings.usage_path, settings.free_cooldown_hours);

        Self {
            admin_id: telegram.admin_id,
            settings,
            entitlements,
            usage,
            resolver,
        }
    }

    /// Returns the entitlement store.
    #[must_use]
    pub const fn entitlements(&self) -> &EntitlementStore {
        &self.entitlements
    }

    /// Returns the usage tracker.
    #[must_use]
    pub const fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Sends the welcome message with the premium button.
    pub async fn handle_start<G: Gateway>(&self, gateway: &G, chat: ChatId) -> Result<(), GatewayError> {
        gateway.send(chat, Reply::WithUpsell(WELCOME.to_owned())).await
    }

    /// Handles a text message that may contain a hosting link.
    pub async fn handle_link<G: Gateway>(
        &self,
        gateway: &G,
        chat: ChatId,
        user: UserId,
        text: &str,
    ) -> Result<LinkOutcome, GatewayError> {
        let text = text.trim();

        if !text
            .to_lowercase()
            .contains(&self.settings.link_marker.to_lowercase())
        {
            gateway.send(chat, Reply::Text(NOT_A_LINK.to_owned())).await?;
            return Ok(LinkOutcome::Rejected);
        }

        let premium = self.entitlements.is_premium(user).await;
        if !premium && !self.usage.can_use_free(user).await {
            info!("User {} hit the free-tier limit", user.0);
            gateway
                .send(chat, Reply::WithUpsell(RATE_LIMITED.to_owned()))
                .await?;
            return Ok(LinkOutcome::RateLimited);
        }

        gateway.send(chat, Reply::Text(PROCESSING.to_owned())).await?;

        let Some(media) = self.resolver.resolve(text).await else {
            info!("No media found for user {}", user.0);
            gateway
                .send(chat, Reply::Text(EXTRACTION_FAILED.to_owned()))
                .await?;
            return Ok(LinkOutcome::ExtractionFailed);
        };

        let fallback = match gateway.send(chat, Reply::Video(media.clone())).await {
            Ok(()) => false,
            Err(e) => {
                warn!("Video delivery failed ({}), sending the address instead", e);
                gateway
                    .send(chat, Reply::Text(format!("✅ Direct link: {media}")))
                    .await?;
                true
            }
        };

        // Re-read: a grant may have landed while the page was resolving.
        let premium = premium || self.entitlements.is_premium(user).await;
        if !premium {
            self.usage.record_use(user).await;
        }

        info!(
            "Delivered media to user {} (premium: {}, fallback: {})",
            user.0, premium, fallback
        );

        Ok(LinkOutcome::Delivered {
            fallback,
            usage_recorded: !premium,
        })
    }

    /// Handles `/addpremium <user_id> <days>`.
    pub async fn handle_add_premium<G: Gateway>(
        &self,
        gateway: &G,
        chat: ChatId,
        caller: UserId,
        args: &str,
    ) -> Result<GrantOutcome, GatewayError> {
        if caller != self.admin_id {
            warn!("Unauthorized /addpremium attempt by user {}", caller.0);
            gateway.send(chat, Reply::Text(UNAUTHORIZED.to_owned())).await?;
            return Ok(GrantOutcome::Unauthorized);
        }

        let grant = match PremiumGrant::parse(args) {
            Ok(grant) => grant,
            Err(e) => {
                debug!("Rejected /addpremium arguments \"{}\": {}", args, e);
                gateway.send(chat, Reply::Text(GRANT_USAGE.to_owned())).await?;
                return Ok(GrantOutcome::InvalidArgs);
            }
        };

        match self.entitlements.grant_premium(grant.user, grant.days).await {
            Ok(expiry) => {
                info!("Granted premium to {} (until {})", grant, expiry);
                gateway
                    .send(
                        chat,
                        Reply::Text(format!(
                            "✅ User {} upgraded for {} days.",
                            grant.user.0, grant.days
                        )),
                    )
                    .await?;
                Ok(GrantOutcome::Granted { grant, expiry })
            }
            Err(e) => {
                error!("addpremium failed for {}: {}", grant, e);
                gateway.send(chat, Reply::Text(GRANT_FAILED.to_owned())).await?;
                Ok(GrantOutcome::Failed)
            }
        }
    }

    /// Handles an inline button press. Returns whether the data was recognised.
    pub async fn handle_callback<G: Gateway>(
        &self,
        gateway: &G,
        chat: ChatId,
        data: Option<&str>,
    ) -> Result<bool, GatewayError> {
        if data != Some(BUY_PREMIUM_CALLBACK) {
            debug!("Ignoring callback data {:?}", data);
            return Ok(false);
        }

        let caption = self.payment_caption();
        let photo = Reply::Photo {
            image: self.settings.qr_image_path.clone(),
            caption: caption.clone(),
        };

        if let Err(e) = gateway.send(chat, photo).await {
            warn!(
                "Could not send payment QR {} ({}), sending text only",
                self.settings.qr_image_path.display(),
                e
            );
            gateway.send(chat, Reply::Markdown(caption)).await?;
        }

        Ok(true)
    }

    /// Builds the `MarkdownV2` payment instructions.
    fn payment_caption(&self) -> String {
        let plans = PREMIUM_PLANS
            .iter()
            .map(|(period, price)| format!("• {}", markdown::escape(&format!("{period} = {price}"))))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "💎 {}\n\n{}\n\n📲 UPI: {}\n{}",
            markdown::bold("Premium Plans:"),
            plans,
            markdown::code_inline(&self.settings.payment_id),
            markdown::escape("Send screenshot to admin after payment."),
        )
    }
}
