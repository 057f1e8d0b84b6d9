//! Command types and definitions.

use std::fmt;
use std::num::ParseIntError;

use chrono::NaiveDate;
use teloxide::types::UserId;
use teloxide::utils::command::BotCommands;
use thiserror::Error;

// Slash commands understood by the bot.
#[derive(BotCommands, Debug, Clone, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,

    // Raw arguments, parsed by `PremiumGrant` so bad input gets a usage reply.
    #[command(description = "grant premium: /addpremium <user_id> <days>")]
    AddPremium(String),
}

/// Arguments of `/addpremium <user_id> <days>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumGrant {
    pub user: UserId,
    pub days: i64,
}

/// Why `/addpremium` arguments were rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantArgsError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("{field} is not an integer: {source}")]
    NotAnInteger {
        field: &'static str,
        source: ParseIntError,
    },

    #[error("days must be positive, got {0}")]
    NonPositiveDays(i64),
}

impl PremiumGrant {
    /// Parses `<user_id> <days>`. Extra arguments are ignored.
    pub fn parse(args: &str) -> Result<Self, GrantArgsError> {
        let mut parts = args.split_whitespace();

        let user = parts
            .next()
            .ok_or(GrantArgsError::Missing("user_id"))?
            .parse()
            .map_err(|source| GrantArgsError::NotAnInteger {
                field: "user_id",
                source,
            })?;

        let days: i64 = parts
            .next()
            .ok_or(GrantArgsError::Missing("days"))?
            .parse()
            .map_err(|source| GrantArgsError::NotAnInteger {
                field: "days",
                source,
            })?;

        if days <= 0 {
            return Err(GrantArgsError::NonPositiveDays(days));
        }

        Ok(Self {
            user: UserId(user),
            days,
        })
    }
}

impl fmt::Display for PremiumGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {} days", self.user.0, self.days)
    }
}

/// How a link message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The message did not contain the link marker.
    Rejected,

    /// Free tier exhausted and no premium.
    RateLimited,

    /// A media address was found and sent.
    Delivered {
        /// The video could not be attached and the raw address was sent instead.
        fallback: bool,
        /// The free-tier use was recorded.
        usage_recorded: bool,
    },

    /// The resolver found nothing.
    ExtractionFailed,
}

/// How an `/addpremium` request was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Unauthorized,
    InvalidArgs,
    Granted { grant: PremiumGrant, expiry: NaiveDate },
    Failed,
}
