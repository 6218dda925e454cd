//! Photo Rotation Bot Library
//!
//! A Telegram bot that collects photos posted to a group and rotates the
//! group's picture through them.
//!
//! This crate provides the core functionality for:
//! - Receiving Bot API updates over a webhook
//! - Queueing uploaded photos in a persisted FIFO
//! - Remembering the chat whose picture is rotated
//! - Applying the next queued photo on a fixed schedule

pub mod commands;
pub mod config;
pub mod scheduler;
pub mod store;
pub mod telegram;
pub mod webhook;
