//! Update router implementation.

use std::sync::Arc;

use teloxide::types::{ChatId, Message, PhotoSize, Update, UpdateKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::types::{BotCommand, CommandResult, MessageKind, WELCOME_MESSAGE};
use crate::scheduler::RotationMessage;
use crate::store::{ImageReference, RotationStore, StoreError};
use crate::telegram::{ChatPlatform, sender_name};

/// One-time notice sent to the chat that becomes the destination.
pub const DESTINATION_SET_MESSAGE: &str =
    "This chat is now the destination: its photo will rotate through the uploaded pictures.";

/// Reply to media that is not a photo.
pub const ASK_FOR_PHOTO_MESSAGE: &str = "Please send a photo.";

/// What the router did with an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A command was executed.
    Command(BotCommand),
    /// Plain text was echoed back.
    Echoed,
    /// A photo was stored and queued.
    Queued(ImageReference),
    /// The photo could not be downloaded; nothing was queued.
    DownloadFailed,
    /// The sender was asked to send a photo instead.
    AskedForPhoto,
    /// Nothing to do.
    Ignored,
}

/// Classifies inbound updates and dispatches them.
pub struct UpdateRouter {
    /// Platform client used for replies and downloads.
    platform: Arc<dyn ChatPlatform>,

    /// Queue and destination.
    store: Arc<RotationStore>,

    /// Channel to the rotation task, if one is running.
    rotation_tx: Option<mpsc::Sender<RotationMessage>>,

    /// Our username, for telling `/cmd@us` from `/cmd@someone_else`.
    bot_username: Option<String>,
}

impl UpdateRouter {
    /// Creates a new update router.
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, store: Arc<RotationStore>) -> Self {
        Self {
            platform,
            store,
            rotation_tx: None,
            bot_username: None,
        }
    }

    /// Ignores commands addressed to bots other than `username`.
    #[must_use]
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Lets `/rotate` reach the rotation task.
    #[must_use]
    pub fn with_rotation_trigger(mut self, tx: mpsc::Sender<RotationMessage>) -> Self {
        self.rotation_tx = Some(tx);
        self
    }

    /// Routes one decoded update.
    ///
    /// Only store failures are returned; failed replies are logged.
    pub async fn handle_update(&self, update: &Update) -> Result<RouteOutcome, StoreError> {
        match &update.kind {
            UpdateKind::Message(msg) => self.handle_message(msg).await,
            UpdateKind::Error(_) => {
                warn!("Ignoring update {} with an unparseable payload", update.id.0);
                Ok(RouteOutcome::Ignored)
            }
            _ => {
                debug!("Ignoring update {} without a message", update.id.0);
                Ok(RouteOutcome::Ignored)
            }
        }
    }

    /// Captures the destination if needed, then dispatches the message.
    pub async fn handle_message(&self, msg: &Message) -> Result<RouteOutcome, StoreError> {
        let chat_id = msg.chat.id;

        if self.store.capture_destination(chat_id.into()).await? {
            self.reply(chat_id, DESTINATION_SET_MESSAGE).await;
        }

        let kind = MessageKind::classify(msg, self.bot_username.as_deref());
        debug!(
            "Message {} from {} in chat {}: {:?}",
            msg.id.0,
            sender_name(msg),
            chat_id.0,
            kind
        );

        match kind {
            MessageKind::Command(command) => {
                let result = self.execute(command, chat_id).await?;
                info!(
                    "Command {} result: success={}, trigger_rotation={}",
                    command, result.success, result.trigger_rotation
                );

                self.reply(chat_id, &result.message).await;
                if result.trigger_rotation {
                    self.trigger_rotation().await;
                }
                Ok(RouteOutcome::Command(command))
            }
            MessageKind::Text(text) => {
                self.reply(chat_id, text).await;
                Ok(RouteOutcome::Echoed)
            }
            MessageKind::Photo(photo) => self.handle_photo(chat_id, photo).await,
            MessageKind::OtherMedia => {
                self.reply(chat_id, ASK_FOR_PHOTO_MESSAGE).await;
                Ok(RouteOutcome::AskedForPhoto)
            }
            MessageKind::UnknownCommand | MessageKind::Other => Ok(RouteOutcome::Ignored),
        }
    }

    /// Executes a parsed command.
    async fn execute(
        &self,
        command: BotCommand,
        chat_id: ChatId,
    ) -> Result<CommandResult, StoreError> {
        match command {
            BotCommand::Start => Ok(CommandResult::success(WELCOME_MESSAGE)),
            BotCommand::Help => Ok(Self::handle_help()),
            BotCommand::Status => self.handle_status().await,
            BotCommand::Rotate => self.handle_rotate(chat_id).await,
        }
    }

    async fn handle_photo(
        &self,
        chat_id: ChatId,
        photo: &PhotoSize,
    ) -> Result<RouteOutcome, StoreError> {
        let file_id = photo.file.id.0.as_str();
        let bytes = match self.platform.download_file(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to download photo {}: {}", file_id, e);
                self.reply(chat_id, &format!("Failed to download the photo: {e}"))
                    .await;
                return Ok(RouteOutcome::DownloadFailed);
            }
        };

        let (image, queued) = self.store.enqueue_image(file_id, &bytes).await?;
        info!(
            "Queued {} ({}x{}), {} image(s) waiting",
            image, photo.width, photo.height, queued
        );

        self.reply(
            chat_id,
            &format!("Image uploaded successfully! Saved as {image}."),
        )
        .await;

        Ok(RouteOutcome::Queued(image))
    }

    async fn handle_status(&self) -> Result<CommandResult, StoreError> {
        let queue = self.store.queue().await?;
        let destination = self.store.destination().await?;

        let next = queue
            .peek()
            .map_or_else(|| "None".to_owned(), ToString::to_string);
        let destination = destination.map_or_else(|| "Not set".to_owned(), |d| d.to_string());

        let message = format!(
            "Queued images: {}\n\
             Next: {next}\n\
             Destination: {destination}",
            queue.len(),
        );

        Ok(CommandResult::success(message))
    }

    async fn handle_rotate(&self, chat_id: ChatId) -> Result<CommandResult, StoreError> {
        let destination = self.store.destination().await?;

        let result = match destination {
            Some(destination) if ChatId::from(destination) == chat_id => {
                if self.rotation_tx.is_some() {
                    CommandResult::success_with_rotation("Rotating to the next photo...")
                } else {
                    CommandResult::error("Rotation is not running.")
                }
            }
            Some(_) => {
                CommandResult::error("Rotation can only be triggered from the destination chat.")
            }
            None => CommandResult::error("No destination chat is set yet."),
        };

        Ok(result)
    }

    fn handle_help() -> CommandResult {
        let mut lines = vec![
            "Send a photo to add it to the rotation queue.".to_owned(),
            String::new(),
        ];

        for command in BotCommand::all() {
            lines.push(format!("  {command} - {}", command.description()));
        }

        CommandResult::success(lines.join("\n"))
    }

    async fn trigger_rotation(&self) {
        let Some(tx) = &self.rotation_tx else {
            return;
        };

        if tx.send(RotationMessage::RotateNow).await.is_err() {
            warn!("Rotation task is not running, trigger dropped");
        }
    }

    /// Sends a reply; failures are logged, not returned.
    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.platform.send_text(chat_id, text).await {
            warn!("Failed to reply in chat {}: {}", chat_id.0, e);
        }
    }
}

impl std::fmt::Debug for UpdateRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateRouter")
            .field("store", &self.store)
            .field("rotation_trigger", &self.rotation_tx.is_some())
            .field("bot_username", &self.bot_username)
            .finish_non_exhaustive()
    }
}
