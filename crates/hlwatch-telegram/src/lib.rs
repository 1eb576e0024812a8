//! Telegram delivery for fill notifications.
//!
//! Wraps the subset of the Bot API the relay needs (`getMe`, `sendMessage`,
//! `getUpdates`) and exposes fill delivery behind the [`Notifier`] port.

pub mod client;
pub mod error;
pub mod notifier;
pub mod types;

pub use client::{TelegramClient, DEFAULT_API_URL};
pub use error::{TelegramError, TelegramResult};
pub use notifier::{
    format_fill_message, BoxFuture, DeliveryOutcome, DynNotifier, MockNotifier, Notifier,
    TelegramNotifier,
};
pub use types::{ApiResponse, Chat, Message, ParseMode, Update, User};
