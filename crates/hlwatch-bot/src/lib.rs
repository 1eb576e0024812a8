//! Hyperliquid fill relay.
//!
//! Watches a chat-managed list of Hyperliquid accounts and posts every new
//! trade fill of those accounts to a Telegram chat:
//! - `userFills` WebSocket feed with reconnection
//! - Telegram command interface (`/add`, `/remove`, `/list`, `/debug`)
//! - Best-effort fill notifications

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod poller;

pub use app::Application;
pub use commands::{Command, CommandHandler, Reply};
pub use config::{AppConfig, Credentials};
pub use error::{AppError, AppResult};
pub use poller::UpdatePoller;
