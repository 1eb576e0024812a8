//! Telegram error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Missing result in {0} response")]
    MissingResult(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TelegramResult<T> = Result<T, TelegramError>;
