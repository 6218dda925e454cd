//! Configuration module for the photo rotation bot.
//!
//! Loads the bot token, the optional seed destination and the server and
//! rotation settings from the environment.

mod settings;

pub use settings::{BotSettings, ConfigError, DEFAULT_ROTATION_INTERVAL_SECS, TelegramConfig};
