//! Command handling module.
//!
//! Parses slash commands and runs the link, admin, welcome and payment
//! flows against the entitlement and usage stores.

mod handler;
mod types;

pub use handler::BotHandler;
pub use types::{Command, GrantArgsError, GrantOutcome, LinkOutcome, PremiumGrant};
