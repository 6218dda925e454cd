//! Application settings and Telegram configuration.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default rotation period: one week.
pub const DEFAULT_ROTATION_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Telegram Bot API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather.
    pub token: String,

    /// Destination chat to seed the store with when none is remembered yet.
    #[serde(default)]
    pub group_chat_id: Option<i64>,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token,
            group_chat_id: None,
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TELEGRAM_TOKEN` to be set; `GROUP_CHAT_ID` is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELEGRAM_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("TELEGRAM_TOKEN"))?;

        let group_chat_id = match lookup("GROUP_CHAT_ID").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidChatId(raw.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            token: token.trim().to_owned(),
            group_chat_id,
        })
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &mask_token(&self.token))
            .field("group_chat_id", &self.group_chat_id)
            .finish()
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Directory holding the queue file, the destination file and images.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the webhook server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Route that receives webhook POSTs.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Delay between the end of one rotation and the start of the next.
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval_secs: u64,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_webhook_path() -> String {
    "/api/bot".to_owned()
}

const fn default_rotation_interval() -> u64 {
    DEFAULT_ROTATION_INTERVAL_SECS
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_addr: default_listen_addr(),
            webhook_path: default_webhook_path(),
            rotation_interval_secs: default_rotation_interval(),
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates bot settings from an arbitrary variable source.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_dir: lookup("DATA_DIR").map_or_else(default_data_dir, PathBuf::from),
            listen_addr: lookup("LISTEN_ADDR")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_listen_addr),
            webhook_path: normalize_path(
                &lookup("WEBHOOK_PATH").unwrap_or_else(default_webhook_path),
            ),
            rotation_interval_secs: lookup("ROTATION_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or_else(default_rotation_interval),
            log_level: lookup("RUST_LOG").unwrap_or_else(default_log_level),
        }
    }

    /// Rotation period as a [`Duration`].
    #[must_use]
    pub const fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }
}

/// Ensures the webhook route starts with a slash.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        default_webhook_path()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

/// Masks a bot token for logging (keeps the numeric bot id).
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _)) => format!("{bot_id}:****"),
        None => "****".to_owned(),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid GROUP_CHAT_ID '{0}' (must be an integer chat id)")]
    InvalidChatId(String),
}
