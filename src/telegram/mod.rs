//! Telegram integration.
//!
//! Decodes inbound webhook updates into teloxide types and wraps the Bot API calls the bot
//! needs behind the [`ChatPlatform`] trait.

mod client;
mod platform;
mod update;

pub use client::{TelegramBot, TelegramError};
#[cfg(test)]
pub use platform::MockChatPlatform;
pub use platform::ChatPlatform;
pub use update::{decode_update, has_other_media, largest_photo, sender_name};
