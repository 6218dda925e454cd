//! Update routing module.
//!
//! Classifies inbound messages (commands, plain text, photos) and
//! dispatches them. The first chat that talks to the bot becomes the
//! rotation destination.

mod handler;
mod types;

pub use handler::{ASK_FOR_PHOTO_MESSAGE, DESTINATION_SET_MESSAGE, RouteOutcome, UpdateRouter};
pub use types::{BotCommand, CommandResult, MessageKind, WELCOME_MESSAGE};
