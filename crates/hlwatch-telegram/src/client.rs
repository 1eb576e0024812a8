//! HTTP client for the Telegram Bot API.
//!
//! Every method is a JSON `POST` to `{api_url}/bot{token}/{method}`. The
//! token is part of the URL, so URLs are never logged and are stripped from
//! reqwest errors.

use crate::error::{TelegramError, TelegramResult};
use crate::types::{
    ApiResponse, GetUpdatesRequest, Message, ParseMode, SendMessageRequest, Update, User,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Only message updates are consumed.
const ALLOWED_UPDATES: &[&str] = &["message"];

/// Client for the Telegram Bot API.
pub struct TelegramClient {
    /// HTTP client.
    client: Client,
    /// `{api_url}/bot{token}`, without trailing slash.
    base_url: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    /// Create a new client.
    ///
    /// `request_timeout` bounds every HTTP request and must exceed the
    /// long-poll timeout passed to [`get_updates`](Self::get_updates).
    pub fn new(api_url: &str, token: &str, request_timeout: Duration) -> TelegramResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TelegramError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    /// Identify the bot (`getMe`).
    pub async fn get_me(&self) -> TelegramResult<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Send a text message (`sendMessage`).
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> TelegramResult<Message> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };
        self.call("sendMessage", &request).await
    }

    /// Long-poll for updates (`getUpdates`).
    ///
    /// `offset` should be one past the highest `update_id` already handled.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> TelegramResult<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &request).await
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> TelegramResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                TelegramError::HttpClient(format!("{method} request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TelegramError::HttpClient(format!("{method} body read failed: {}", e.without_url()))
        })?;

        // The API answers errors with a JSON envelope and a non-2xx status,
        // so the envelope is decoded before looking at the status.
        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                warn!(method, %status, "Non-JSON error response from Telegram");
                return Err(TelegramError::HttpClient(format!("HTTP {status}: {body}")));
            }
        };

        debug!(method, %status, ok = envelope.ok, "Telegram API call completed");
        envelope.into_result(method)
    }
}
