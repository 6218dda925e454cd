//! Telegram Bot API client wrapper.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{File, FileId, InputFile};
use teloxide::{DownloadError, RequestError};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::ChatPlatform;
use crate::config::TelegramConfig;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("API request failed: {0}")]
    Request(RequestError),

    #[error("File download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Platform error: {0}")]
    Other(String),
}

impl From<RequestError> for TelegramError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::RetryAfter(seconds) => Self::FloodWait(seconds.seconds()),
            other => Self::Request(other),
        }
    }
}

/// Bot API client used in production.
#[derive(Debug, Clone)]
pub struct TelegramBot {
    bot: Bot,
}

impl TelegramBot {
    /// Creates a client for the configured bot token.
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(config.token.clone()),
        }
    }

    /// Checks the token against the API and returns the bot's username.
    pub async fn verify(&self) -> Result<String, TelegramError> {
        let me = self.bot.get_me().await?;
        let name = me.user.username.clone().ok_or_else(|| {
            TelegramError::Other(format!("bot {} has no username", me.user.id))
        })?;
        info!("Authorized as @{}", name);
        Ok(name)
    }
}

#[async_trait]
impl ChatPlatform for TelegramBot {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        debug!("Sending message to {}: \"{}\"", chat_id.0, truncate_for_log(text, 30));
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn set_chat_photo(
        &self,
        chat_id: ChatId,
        photo: Vec<u8>,
        file_name: &str,
    ) -> Result<(), TelegramError> {
        info!("Setting photo of chat {} to {}", chat_id.0, file_name);

        let input = InputFile::memory(photo).file_name(file_name.to_owned());
        match self.bot.set_chat_photo(chat_id, input).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let err: TelegramError = e.into();
                if let TelegramError::FloodWait(seconds) = &err {
                    warn!("Flood wait triggered: {} seconds", seconds);
                }
                Err(err)
            }
        }
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TelegramError> {
        let file = self.bot.get_file(FileId(file_id.to_owned())).await?;
        let path = download_path(&file)?;

        let mut buf = Vec::new();
        self.bot.download_file(path, &mut buf).await?;
        debug!("Downloaded {} bytes for file {}", buf.len(), file_id);

        Ok(buf)
    }
}

/// Server-side path of a file, as needed by the download endpoint.
fn download_path(file: &File) -> Result<&str, TelegramError> {
    if file.path.is_empty() {
        return Err(TelegramError::Other(format!(
            "file {} has no download path",
            file.meta.id
        )));
    }
    Ok(&file.path)
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
