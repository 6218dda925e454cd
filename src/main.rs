//! Photo Rotation Bot - Main Entry Point
//!
//! Serves the Telegram webhook and runs the weekly group photo rotation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use photo_rotation_bot::commands::UpdateRouter;
use photo_rotation_bot::config::{BotSettings, TelegramConfig};
use photo_rotation_bot::scheduler::{RotationMessage, RotationScheduler};
use photo_rotation_bot::store::{DestinationId, RotationStore};
use photo_rotation_bot::telegram::{ChatPlatform, TelegramBot};
use photo_rotation_bot::webhook;

/// Telegram bot that rotates a group's photo through uploaded pictures.
#[derive(Parser, Debug)]
#[command(name = "photo_rotation_bot")]
#[command(about = "Queue group photo uploads and rotate the group picture weekly")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Directory for the queue, the destination and images (overrides DATA_DIR).
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let mut settings = BotSettings::from_env_with_defaults();
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }

    let store = RotationStore::open(&settings.data_dir)
        .await
        .with_context(|| format!("Failed to open data dir {}", settings.data_dir.display()))?;

    if let Some(chat_id) = tg_config.group_chat_id {
        if store
            .capture_destination(DestinationId::new(chat_id))
            .await
            .context("Failed to seed destination chat")?
        {
            info!("Destination seeded from GROUP_CHAT_ID: {}", chat_id);
        } else {
            debug!("Destination already stored, GROUP_CHAT_ID ignored");
        }
    }

    info!(
        "Using data dir {} (rotation every {}s)",
        settings.data_dir.display(),
        settings.rotation_interval_secs
    );

    // Connect to Telegram
    let bot = TelegramBot::new(&tg_config);
    let bot_username = match bot.verify().await {
        Ok(username) => Some(username),
        Err(e) => {
            warn!("Could not verify bot token: {}", e);
            None
        }
    };

    let platform: Arc<dyn ChatPlatform> = Arc::new(bot);
    let store = Arc::new(store);

    // Create scheduler channel
    let (rotation_tx, rotation_rx) = mpsc::channel::<RotationMessage>(8);

    let mut router = UpdateRouter::new(Arc::clone(&platform), Arc::clone(&store))
        .with_rotation_trigger(rotation_tx.clone());
    if let Some(username) = bot_username {
        router = router.with_bot_username(username);
    }
    let router = Arc::new(router);

    let scheduler = RotationScheduler::new(Arc::clone(&platform), Arc::clone(&store))
        .with_period(settings.rotation_interval());

    // Spawn scheduler task
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(rotation_rx).await;
    });

    let listener = TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.listen_addr))?;

    info!("Receiving updates on {}", settings.webhook_path);
    let app = webhook::app(router, &settings.webhook_path);
    let served = webhook::serve(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down...");
    })
    .await;

    // Cleanup
    info!("Shutting down...");
    let _ = rotation_tx.send(RotationMessage::Shutdown).await;
    let _ = scheduler_handle.await;

    served.context("Webhook server failed")
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
