//! Outbound calls the bot makes against the messaging platform.

use async_trait::async_trait;
use teloxide::types::ChatId;

use super::TelegramError;

/// The three platform calls the router and the rotation task rely on.
///
/// Constructed once in `main` and handed to both, so tests can swap in a
/// fake without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError>;

    /// Replaces the chat's photo with the given image bytes.
    async fn set_chat_photo(
        &self,
        chat_id: ChatId,
        photo: Vec<u8>,
        file_name: &str,
    ) -> Result<(), TelegramError>;

    /// Downloads the bytes of an uploaded file.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TelegramError>;
}
