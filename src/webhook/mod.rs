//! Webhook server module.
//!
//! Receives Bot API updates over HTTP and hands them to the router.

mod server;

pub use server::{app, handle_webhook, serve};
