//! Command types and message classification.

use std::fmt;

use teloxide::types::{Message, PhotoSize};

use crate::telegram::{has_other_media, largest_photo};

/// Reply to `/start`.
pub const WELCOME_MESSAGE: &str = "Hello! Send me a picture and I'll upload it.";

/// Available bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Greet the sender.
    Start,

    /// List the commands.
    Help,

    /// Show the queue length, the next image and the destination.
    Status,

    /// Rotate to the next queued image right away.
    Rotate,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts the `/name@botname` form and ignores arguments. A command
    /// addressed to a different bot than `bot_username` is not ours. Returns
    /// `None` if the message is not a known command.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let after_slash = text.trim().strip_prefix('/')?;

        let word = after_slash.split_whitespace().next()?;
        let cmd = match word.split_once('@') {
            Some((cmd, addressee)) => {
                let for_us = bot_username.is_none_or(|ours| {
                    addressee.eq_ignore_ascii_case(ours.trim_start_matches('@'))
                });
                if !for_us {
                    return None;
                }
                cmd
            }
            None => word,
        };

        match cmd.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "status" | "queue" => Some(Self::Status),
            "rotate" | "next" => Some(Self::Rotate),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Status => "status",
            Self::Rotate => "rotate",
        }
    }

    /// Returns the command description for help.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Start => "Show the welcome message",
            Self::Help => "Show this help",
            Self::Status => "Show the upload queue and the destination chat",
            Self::Rotate => "Rotate to the next photo now (destination chat only)",
        }
    }

    /// Returns every command in help order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Start, Self::Status, Self::Rotate, Self::Help]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,

    /// Whether to trigger an immediate rotation.
    pub trigger_rotation: bool,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            trigger_rotation: false,
        }
    }

    /// Creates a successful result that triggers a rotation.
    #[must_use]
    pub fn success_with_rotation(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            trigger_rotation: true,
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            trigger_rotation: false,
        }
    }
}

/// What an inbound message is, for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind<'a> {
    /// A recognized command.
    Command(BotCommand),
    /// Slash-prefixed text that is not one of ours.
    UnknownCommand,
    /// Plain text.
    Text(&'a str),
    /// A photo; carries its highest-resolution variant.
    Photo(&'a PhotoSize),
    /// Documents, stickers, videos and other non-photo media.
    OtherMedia,
    /// Service messages and anything else without content to act on.
    Other,
}

impl<'a> MessageKind<'a> {
    /// Classifies a message. Photos win over captions, media over text.
    #[must_use]
    pub fn classify(msg: &'a Message, bot_username: Option<&str>) -> Self {
        if let Some(photo) = largest_photo(msg) {
            return Self::Photo(photo);
        }

        if has_other_media(msg) {
            return Self::OtherMedia;
        }

        match msg.text() {
            Some(text) if text.starts_with('/') => {
                BotCommand::parse(text, bot_username).map_or(Self::UnknownCommand, Self::Command)
            }
            Some(text) => Self::Text(text),
            None => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(fields: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": {"id": -100, "type": "group", "title": "Family"}
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), fields.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(value).unwrap()
    }

    const BOT: Option<&str> = Some("rotator_bot");

    #[test]
    fn test_parse_commands() {
        assert_eq!(BotCommand::parse("/start", BOT), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/START", BOT), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/start@rotator_bot", BOT), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/start@Rotator_Bot", BOT), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/start please", BOT), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/queue", BOT), Some(BotCommand::Status));
        assert_eq!(BotCommand::parse("/next", BOT), Some(BotCommand::Rotate));
    }

    #[test]
    fn test_parse_rejects_non_commands() {
        assert_eq!(BotCommand::parse("start", BOT), None);
        assert_eq!(BotCommand::parse("/", BOT), None);
        assert_eq!(BotCommand::parse("/unknown", BOT), None);
    }

    #[test]
    fn test_parse_ignores_commands_for_other_bots() {
        assert_eq!(BotCommand::parse("/start@someotherbot", BOT), None);
        assert_eq!(BotCommand::parse("/rotate@someotherbot now", BOT), None);
        assert_eq!(
            BotCommand::parse("/start@anybot", None),
            Some(BotCommand::Start)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(BotCommand::Status.to_string(), "/status");
    }

    #[test]
    fn test_classify_text() {
        let msg = message(json!({"text": "hello there"}));
        assert_eq!(MessageKind::classify(&msg, BOT), MessageKind::Text("hello there"));
    }

    #[test]
    fn test_classify_commands() {
        let msg = message(json!({"text": "/start"}));
        assert_eq!(
            MessageKind::classify(&msg, BOT),
            MessageKind::Command(BotCommand::Start)
        );

        let msg = message(json!({"text": "/settitle"}));
        assert_eq!(MessageKind::classify(&msg, BOT), MessageKind::UnknownCommand);

        let msg = message(json!({"text": "/start@someotherbot"}));
        assert_eq!(MessageKind::classify(&msg, BOT), MessageKind::UnknownCommand);
    }

    #[test]
    fn test_classify_photo_with_caption() {
        let msg = message(json!({
            "caption": "/start",
            "photo": [{"file_id": "p", "file_unique_id": "u", "width": 10, "height": 10, "file_size": 100}]
        }));
        assert!(matches!(
            MessageKind::classify(&msg, BOT),
            MessageKind::Photo(p) if p.file.id.0 == "p"
        ));
    }

    #[test]
    fn test_classify_media_and_service() {
        let msg = message(json!({
            "document": {"file_id": "d", "file_unique_id": "du", "file_size": 10}
        }));
        assert_eq!(MessageKind::classify(&msg, BOT), MessageKind::OtherMedia);

        let msg = message(json!({"new_chat_title": "Renamed"}));
        assert_eq!(MessageKind::classify(&msg, BOT), MessageKind::Other);
    }

    #[test]
    fn test_command_result_constructors() {
        assert!(CommandResult::success("ok").success);
        assert!(CommandResult::success_with_rotation("ok").trigger_rotation);
        assert!(!CommandResult::error("no").success);
    }
}
