//! Diskwala Bot Library
//!
//! A Telegram bot that turns Diskwala page links into playable videos.
//!
//! This crate provides the core functionality for:
//! - Loading and validating the bot configuration
//! - Persisting premium entitlements and free-tier usage in flat JSON files
//! - Scraping hosting pages for a direct media address
//! - Handling links, admin grants and payment prompts via the Bot API

pub mod commands;
pub mod config;
pub mod resolver;
pub mod store;
pub mod telegram;
