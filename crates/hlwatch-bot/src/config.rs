//! Application configuration.
//!
//! Tunables come from an optional TOML file; the bot token and target chat
//! come only from the environment.

use crate::error::{AppError, AppResult};
use hlwatch_telegram::DEFAULT_API_URL;
use hlwatch_ws::{ConnectionConfig, DEFAULT_WS_URL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the notification chat id.
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Feed client tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSocketSettings {
    /// Consecutive failed attempts before exiting (0 = retry forever). Default: 5.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay (ms). Default: 1,000.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Reconnect delay cap before jitter (ms). Default: 30,000.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Exclusive upper bound of reconnect jitter (ms). Default: 100.
    #[serde(default = "default_reconnect_jitter_ms")]
    pub reconnect_jitter_ms: u64,
    /// Application-level ping interval (ms). Default: 15,000.
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Handshake timeout for one connection attempt (ms). Default: 10,000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

fn default_reconnect_jitter_ms() -> u64 {
    100
}

fn default_ping_interval_ms() -> u64 {
    15_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            reconnect_jitter_ms: default_reconnect_jitter_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Bot API tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// `getUpdates` long-poll timeout (s). Default: 30.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// HTTP request timeout (s), must exceed the poll timeout. Default: 40.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    40
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Bot credentials, read from the environment.
#[derive(Clone, Default)]
pub struct Credentials {
    token: String,
    chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Credentials {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Read `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID` from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`. Missing or blank values are errors.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} must be set")))
        };

        Ok(Self {
            token: require(TOKEN_ENV)?,
            chat_id: require(CHAT_ID_ENV)?,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Feed endpoint.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Bot API base URL.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    #[serde(default)]
    pub websocket: WebSocketSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    /// Never read from or written to the config file.
    #[serde(skip)]
    pub credentials: Credentials,
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

fn default_telegram_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            telegram_api_url: default_telegram_api_url(),
            websocket: WebSocketSettings::default(),
            telegram: TelegramSettings::default(),
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    /// Load tunables from `path` and credentials from the environment.
    ///
    /// `path` of `None` means [`DEFAULT_CONFIG_PATH`], which may be absent.
    /// An explicitly given path must exist.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                info!(path = DEFAULT_CONFIG_PATH, "No config file, using defaults");
                Self::default()
            }
        };

        config.credentials = Credentials::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load tunables from a TOML file. Credentials are left empty.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> AppResult<()> {
        if self.ws_url.trim().is_empty() {
            return Err(AppError::Config("ws_url must not be empty".to_string()));
        }
        if self.telegram.request_timeout_secs <= self.telegram.poll_timeout_secs {
            return Err(AppError::Config(format!(
                "telegram.request_timeout_secs ({}) must exceed telegram.poll_timeout_secs ({})",
                self.telegram.request_timeout_secs, self.telegram.poll_timeout_secs
            )));
        }
        Ok(())
    }

    /// Feed client configuration.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.ws_url.clone(),
            max_reconnect_attempts: self.websocket.max_reconnect_attempts,
            reconnect_base_delay_ms: self.websocket.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.websocket.reconnect_max_delay_ms,
            reconnect_jitter_ms: self.websocket.reconnect_jitter_ms,
            ping_interval_ms: self.websocket.ping_interval_ms,
            connect_timeout_ms: self.websocket.connect_timeout_ms,
        }
    }
}
