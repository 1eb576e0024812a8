//! WebSocket feed client for Hyperliquid fill notifications.
//!
//! Provides a single long-lived connection with:
//! - Automatic reconnection with capped exponential backoff and a fail-fast attempt limit
//! - `userFills` subscriptions derived from the watch-list, restored on every connect
//! - Application-level ping every 15s
//! - Dispatch of non-snapshot fills for watched addresses over a channel

pub mod connection;
pub mod error;
pub mod heartbeat;
pub mod message;
pub mod subscription;

pub use connection::{
    labeled_fills, ConnectionConfig, ConnectionManager, ConnectionState, DEFAULT_WS_URL,
};
pub use error::{WsError, WsResult};
pub use heartbeat::{HeartbeatManager, HeartbeatStats};
pub use message::{
    extract_subscription_type, extract_subscription_user, ChannelMessage, PongMessage, UserFillsPayload, UserFillsResult,
    WsMessage, WsRequest,
};
pub use subscription::SubscriptionManager;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any network connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
