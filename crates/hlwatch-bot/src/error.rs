//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<hlwatch_ws::WsError>),

    #[error("Telegram error: {0}")]
    Telegram(#[from] hlwatch_telegram::TelegramError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] hlwatch_telemetry::TelemetryError),

    #[error("Task failed: {0}")]
    Task(String),
}

impl From<hlwatch_ws::WsError> for AppError {
    fn from(e: hlwatch_ws::WsError) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

pub type AppResult<T> = Result<T, AppError>;
