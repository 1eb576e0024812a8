//! WebSocket connection manager.
//!
//! Handles connection lifecycle, automatic reconnection with exponential backoff,
//! and subscription restoration after reconnection.

use crate::error::{WsError, WsResult};
use crate::heartbeat::{HeartbeatManager, HeartbeatStats};
use crate::message::{UserFillsPayload, WsMessage, WsRequest, SUBSCRIPTION_RESPONSE, USER_FILLS};
use crate::subscription::SubscriptionManager;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use hlwatch_core::{distinct_addresses, find_by_address, AddressEntry, LabeledFill};
use parking_lot::RwLock;
use rand::Rng;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Hyperliquid mainnet WebSocket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

/// Capacity of the internal command queue.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Largest exponent applied to the base delay (keeps the shift in range).
const MAX_BACKOFF_EXPONENT: u32 = 20;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Consecutive failed attempts before giving up (0 = infinite).
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff (before jitter).
    pub reconnect_max_delay_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay.
    pub reconnect_jitter_ms: u64,
    /// Ping interval.
    pub ping_interval_ms: u64,
    /// Time allowed for the TCP/TLS/upgrade handshake of one attempt.
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30_000,
            reconnect_jitter_ms: 100,
            ping_interval_ms: 15_000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl ConnectionConfig {
    /// Backoff delay without jitter: `min(base * 2^attempt, max)`.
    ///
    /// attempt=1 -> 2*base, attempt=2 -> 4*base, ...
    pub fn base_backoff_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        self.reconnect_base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.reconnect_max_delay_ms)
    }

    /// Backoff delay for `attempt` including random jitter in `[0, jitter)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter = if self.reconnect_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.reconnect_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.base_backoff_ms(attempt) + jitter)
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Commands handled by the message loop of the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedCommand {
    /// Re-send subscriptions for the current watch-list.
    Resubscribe,
}

/// WebSocket connection manager.
///
/// Owns the feed-side state: the watch-list snapshot used for filtering,
/// the last raw frame, and the subscriptions of the live socket.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: RwLock<ConnectionState>,
    watch_list: RwLock<Vec<AddressEntry>>,
    subscriptions: SubscriptionManager,
    heartbeat: HeartbeatManager,
    last_message: RwLock<Option<serde_json::Value>>,
    fill_tx: mpsc::Sender<LabeledFill>,
    /// Consecutive failures since the last successful open.
    reconnect_count: RwLock<u32>,
    command_tx: mpsc::Sender<FeedCommand>,
    command_rx: TokioMutex<mpsc::Receiver<FeedCommand>>,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager delivering matched fills to `fill_tx`.
    pub fn new(config: ConnectionConfig, fill_tx: mpsc::Sender<LabeledFill>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let heartbeat = HeartbeatManager::new(config.ping_interval_ms);
        Self {
            config,
            state: RwLock::new(ConnectionState::Disconnected),
            watch_list: RwLock::new(Vec::new()),
            subscriptions: SubscriptionManager::new(),
            heartbeat,
            last_message: RwLock::new(None),
            fill_tx,
            reconnect_count: RwLock::new(0),
            command_tx,
            command_rx: TokioMutex::new(command_rx),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Consecutive failed attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        *self.reconnect_count.read()
    }

    /// Most recent frame received from the feed, if any.
    pub fn last_message(&self) -> Option<serde_json::Value> {
        self.last_message.read().clone()
    }

    /// Current watch-list snapshot.
    pub fn watch_list(&self) -> Vec<AddressEntry> {
        self.watch_list.read().clone()
    }

    /// Addresses subscribed on the live connection.
    pub fn active_subscriptions(&self) -> Vec<String> {
        self.subscriptions.active_subscriptions()
    }

    /// Ping/pong bookkeeping of the current connection.
    pub fn heartbeat_stats(&self) -> HeartbeatStats {
        self.heartbeat.stats()
    }

    /// Replace the watch-list.
    ///
    /// When connected, the live connection re-sends one subscribe per entry
    /// and unsubscribes addresses that are no longer watched. Otherwise the
    /// next successful open subscribes to the new list.
    ///
    /// Calls that arrive while the command queue is full are coalesced into
    /// an already queued re-subscription, which reads the snapshot current
    /// at send time. The server therefore always ends up subscribed to the
    /// latest list, but a burst of calls may produce fewer subscribe batches
    /// than calls.
    pub fn set_watch_list(&self, entries: Vec<AddressEntry>) {
        let count = entries.len();
        *self.watch_list.write() = entries;

        if self.state() != ConnectionState::Connected {
            debug!(count, "Watch-list updated while not connected");
            return;
        }

        match self.command_tx.try_send(FeedCommand::Resubscribe) {
            Ok(()) => debug!(count, "Re-subscription queued"),
            // A pending re-subscription reads the latest snapshot anyway.
            Err(mpsc::error::TrySendError::Full(_)) => debug!("Re-subscription already pending"),
            Err(mpsc::error::TrySendError::Closed(_)) => warn!("Feed command channel closed"),
        }
    }

    /// Signal graceful shutdown.
    ///
    /// Closes the live connection, interrupts any backoff wait and
    /// suppresses further reconnects.
    pub fn shutdown(&self) {
        info!("ConnectionManager shutdown requested");
        self.shutdown_token.cancel();
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect and keep the feed alive until shutdown.
    ///
    /// Returns `Ok(())` after `shutdown()`, or
    /// `Err(WsError::ReconnectExhausted)` once `max_reconnect_attempts`
    /// consecutive attempts have failed.
    pub async fn connect(&self) -> WsResult<()> {
        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting connect loop");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }

            *self.state.write() = ConnectionState::Connecting;

            if let Err(e) = self.try_connect().await {
                warn!(error = %e, "WebSocket connection lost");
            }
            self.subscriptions.reset();

            if self.is_shutdown() {
                info!("Shutdown requested after disconnect, not reconnecting");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }

            let failures = *self.reconnect_count.read();
            let max = self.config.max_reconnect_attempts;
            if max > 0 && failures >= max {
                error!(attempts = failures, "Max reconnection attempts reached");
                *self.state.write() = ConnectionState::Disconnected;
                return Err(WsError::ReconnectExhausted { attempts: failures });
            }

            let attempt = failures + 1;
            *self.reconnect_count.write() = attempt;
            *self.state.write() = ConnectionState::Reconnecting;

            let delay = self.config.backoff_delay(attempt);
            warn!(
                attempt,
                max_attempts = max,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }
            }
        }
    }

    /// Run one connection until it closes.
    ///
    /// Returns `Ok(())` only when shutdown was requested.
    async fn try_connect(&self) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to WebSocket");

        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let handshake = tokio::select! {
            biased;
            () = self.shutdown_token.cancelled() => {
                info!("Shutdown requested during handshake");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }
            result = tokio::time::timeout(
                connect_timeout,
                connect_async_tls_with_config(&self.config.url, None, true, None),
            ) => result,
        };
        let (ws_stream, _response) = match handshake {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => return Err(WsError::ConnectionFailed(e.to_string())),
            Err(_) => {
                return Err(WsError::ConnectionFailed(format!(
                    "handshake timed out after {}ms",
                    self.config.connect_timeout_ms
                )))
            }
        };
        let (mut write, mut read) = ws_stream.split();

        *self.state.write() = ConnectionState::Connected;
        *self.reconnect_count.write() = 0;
        info!("WebSocket connected");

        self.heartbeat.reset();
        self.subscriptions.reset();

        let mut commands = self.command_rx.lock().await;
        // The full subscribe below covers anything queued before this open.
        while commands.try_recv().is_ok() {}

        let entries = self.watch_list();
        self.send_subscriptions(&mut write, &entries).await?;

        let mut ping = self.heartbeat.ticker();

        loop {
            tokio::select! {
                biased;

                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_message(&text).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.heartbeat.record_pong();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (u16::from(f.code), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "WebSocket closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Err(WsError::ConnectionClosed {
                                code: 1006,
                                reason: "Stream ended".to_string(),
                            });
                        }
                        _ => {}
                    }
                }

                Some(command) = commands.recv() => {
                    match command {
                        FeedCommand::Resubscribe => self.resubscribe(&mut write).await?,
                    }
                }

                _ = ping.tick() => {
                    let msg = serde_json::to_string(&WsRequest::ping())?;
                    write.send(Message::Text(msg)).await?;
                    self.heartbeat.record_ping();
                }
            }
        }
    }

    /// Send one subscribe request per watch-list entry.
    async fn send_subscriptions(&self, write: &mut WsSink, entries: &[AddressEntry]) -> WsResult<()> {
        info!(count = entries.len(), "Subscribing to userFills");

        for entry in entries {
            let req = WsRequest::subscribe_user_fills(entry.address.as_str());
            write.send(Message::Text(serde_json::to_string(&req)?)).await?;
            self.subscriptions.add_subscription(entry.address.as_str());
            info!(label = %entry.label, user = %entry.address, "Subscribed to userFills");
        }

        Ok(())
    }

    /// Unsubscribe dropped addresses, then subscribe the current list.
    async fn resubscribe(&self, write: &mut WsSink) -> WsResult<()> {
        let entries = self.watch_list();
        let current = distinct_addresses(&entries);

        for address in self.subscriptions.stale(&current) {
            let req = WsRequest::unsubscribe_user_fills(&address);
            write.send(Message::Text(serde_json::to_string(&req)?)).await?;
            self.subscriptions.remove_subscription(&address);
            info!(user = %address, "Unsubscribed from userFills");
        }

        self.send_subscriptions(write, &entries).await
    }

    async fn handle_text_message(&self, text: &str) {
        self.heartbeat.record_message();

        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to parse WebSocket frame, dropping");
                return;
            }
        };
        *self.last_message.write() = Some(value.clone());

        let msg: WsMessage = match serde_json::from_value(value) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "Ignoring frame without channel");
                return;
            }
        };

        match &msg {
            WsMessage::Pong(pong) => {
                if pong.is_pong() {
                    self.heartbeat.record_pong();
                } else {
                    debug!(channel = %pong.channel, "Ignoring message without data");
                }
            }
            WsMessage::Channel(channel_msg) => match channel_msg.channel.as_str() {
                SUBSCRIPTION_RESPONSE => {
                    debug!(data = ?channel_msg.data, "Received subscription response");
                    self.subscriptions.handle_ack(&channel_msg.data);
                }
                USER_FILLS => self.dispatch_fills(&msg).await,
                "error" => {
                    warn!(data = ?channel_msg.data, "Received error channel message");
                }
                other => {
                    debug!(channel = %other, "Ignoring unhandled channel");
                }
            },
        }
    }

    async fn dispatch_fills(&self, msg: &WsMessage) {
        let Some(payload) = msg.as_user_fills() else {
            warn!("Malformed userFills payload, dropping");
            return;
        };

        let labeled = {
            let entries = self.watch_list.read();
            labeled_fills(&payload, &entries)
        };

        for labeled_fill in labeled {
            info!(
                label = %labeled_fill.label,
                coin = %labeled_fill.fill.coin,
                dir = %labeled_fill.fill.dir,
                px = %labeled_fill.fill.px,
                sz = %labeled_fill.fill.sz,
                "Fill received"
            );
            if self.fill_tx.send(labeled_fill).await.is_err() {
                warn!("Fill receiver dropped");
                return;
            }
        }
    }
}

/// Match a userFills batch against the watch-list.
///
/// Snapshots and batches for unwatched addresses yield nothing. Address
/// comparison is case-insensitive.
pub fn labeled_fills(payload: &UserFillsPayload, entries: &[AddressEntry]) -> Vec<LabeledFill> {
    if payload.is_snapshot {
        debug!(
            user = %payload.user,
            count = payload.fills.len(),
            "Skipping userFills snapshot"
        );
        return Vec::new();
    }

    let Some(entry) = find_by_address(entries, &payload.user) else {
        debug!(user = %payload.user, "Fills for unwatched address, skipping");
        return Vec::new();
    };

    let result = payload.parse_fills();
    if result.failed_count > 0 {
        warn!(
            user = %payload.user,
            failed = result.failed_count,
            "Dropped malformed fill elements"
        );
    }

    result
        .fills
        .into_iter()
        .map(|fill| LabeledFill {
            fill,
            label: entry.label.clone(),
            user: payload.user.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlwatch_core::Address;
    use serde_json::json;

    const ADDR_A: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn entry(label: &str, address: &str) -> AddressEntry {
        AddressEntry::new(label, Address::parse(address).unwrap())
    }

    fn fills_payload(value: serde_json::Value) -> UserFillsPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert_eq!(config.url, DEFAULT_WS_URL);
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.ping_interval_ms, 15_000);
        assert_eq!(config.reconnect_max_delay_ms, 30_000);
        assert_eq!(config.connect_timeout_ms, 10_000);
    }

    #[test]
    fn test_base_backoff_doubles_then_caps() {
        let config = ConnectionConfig::default();
        assert_eq!(config.base_backoff_ms(1), 2_000);
        assert_eq!(config.base_backoff_ms(2), 4_000);
        assert_eq!(config.base_backoff_ms(3), 8_000);
        assert_eq!(config.base_backoff_ms(4), 16_000);
        assert_eq!(config.base_backoff_ms(5), 30_000);
        assert_eq!(config.base_backoff_ms(u32::MAX), 30_000);
    }

    #[test]
    fn test_backoff_delay_within_jitter_window() {
        let config = ConnectionConfig::default();
        for attempt in 1..=5 {
            let base = config.base_backoff_ms(attempt);
            for _ in 0..50 {
                let delay = config.backoff_delay(attempt).as_millis() as u64;
                assert!(delay >= base, "attempt {attempt}: {delay} < {base}");
                assert!(delay < base + 100, "attempt {attempt}: {delay} >= {base}+100");
            }
        }
    }

    #[test]
    fn test_backoff_without_jitter() {
        let config = ConnectionConfig {
            reconnect_jitter_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.backoff_delay(1), Duration::from_millis(2_000));
    }

    #[test]
    fn test_labeled_fills_case_insensitive_match() {
        let entries = vec![entry("A", ADDR_A)];
        let payload = fills_payload(json!({
            "user": ADDR_A.to_lowercase(),
            "fills": [{
                "coin": "BTC", "px": "50000", "sz": "0.1", "time": 1700000000000u64,
                "dir": "Open Long", "closedPnl": "0"
            }]
        }));

        let labeled = labeled_fills(&payload, &entries);
        assert_eq!(labeled.len(), 1);
        assert_eq!(labeled[0].label, "A");
        assert_eq!(labeled[0].fill.coin, "BTC");
        assert_eq!(labeled[0].user, ADDR_A.to_lowercase());
    }

    #[test]
    fn test_labeled_fills_unwatched_address() {
        let entries = vec![entry("A", ADDR_A)];
        let payload = fills_payload(json!({
            "user": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            "fills": [{
                "coin": "BTC", "px": "1", "sz": "1", "time": 1, "dir": "Buy", "closedPnl": "0"
            }]
        }));

        assert!(labeled_fills(&payload, &entries).is_empty());
    }

    #[test]
    fn test_labeled_fills_snapshot_ignored() {
        let entries = vec![entry("A", ADDR_A)];
        let payload = fills_payload(json!({
            "isSnapshot": true,
            "user": ADDR_A,
            "fills": [{
                "coin": "BTC", "px": "1", "sz": "1", "time": 1, "dir": "Buy", "closedPnl": "0"
            }]
        }));

        assert!(labeled_fills(&payload, &entries).is_empty());
    }

    #[test]
    fn test_labeled_fills_keeps_good_elements() {
        let entries = vec![entry("A", ADDR_A)];
        let payload = fills_payload(json!({
            "user": ADDR_A,
            "fills": [
                {"coin": "BTC", "px": "1", "sz": "1", "time": 1, "dir": "Buy", "closedPnl": "0"},
                {"coin": "ETH"},
                {"coin": "SOL", "px": "2", "sz": "3", "time": 2, "dir": "Sell", "closedPnl": "1"}
            ]
        }));

        let labeled = labeled_fills(&payload, &entries);
        let coins: Vec<&str> = labeled.iter().map(|l| l.fill.coin.as_str()).collect();
        assert_eq!(coins, vec!["BTC", "SOL"]);
    }

    #[tokio::test]
    async fn test_set_watch_list_while_disconnected_queues_nothing() {
        let (fill_tx, _fill_rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(ConnectionConfig::default(), fill_tx);

        manager.set_watch_list(vec![entry("A", ADDR_A)]);

        assert_eq!(manager.watch_list().len(), 1);
        assert!(manager.command_rx.lock().await.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_set_watch_list_while_connected_queues_resubscribe() {
        let (fill_tx, _fill_rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(ConnectionConfig::default(), fill_tx);
        *manager.state.write() = ConnectionState::Connected;

        manager.set_watch_list(vec![entry("A", ADDR_A)]);

        let queued = manager.command_rx.lock().await.try_recv();
        assert_eq!(queued.ok(), Some(FeedCommand::Resubscribe));
    }

    #[tokio::test]
    async fn test_set_watch_list_burst_coalesces_when_queue_full() {
        let (fill_tx, _fill_rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(ConnectionConfig::default(), fill_tx);
        *manager.state.write() = ConnectionState::Connected;

        for i in 0..COMMAND_CHANNEL_CAPACITY + 10 {
            manager.set_watch_list(vec![entry(&format!("L{i}"), ADDR_A)]);
        }

        let mut commands = manager.command_rx.lock().await;
        let mut queued = 0;
        while commands.try_recv().is_ok() {
            queued += 1;
        }
        assert_eq!(queued, COMMAND_CHANNEL_CAPACITY);
        // The snapshot read by the queued commands is the latest one
        let label = format!("L{}", COMMAND_CHANNEL_CAPACITY + 9);
        assert_eq!(manager.watch_list()[0].label, label);
    }

    #[tokio::test]
    async fn test_handle_text_message_stores_last_message() {
        let (fill_tx, _fill_rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(ConnectionConfig::default(), fill_tx);
        assert!(manager.last_message().is_none());

        manager
            .handle_text_message(r#"{"channel":"somethingNew","data":{"x":1}}"#)
            .await;
        assert_eq!(manager.last_message().unwrap()["data"]["x"], 1);

        // Invalid JSON leaves the previous message in place
        manager.handle_text_message("not json").await;
        assert_eq!(manager.last_message().unwrap()["channel"], "somethingNew");
    }

    #[tokio::test]
    async fn test_handle_text_message_dispatches_watched_fill() {
        let (fill_tx, mut fill_rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(ConnectionConfig::default(), fill_tx);
        manager.set_watch_list(vec![entry("A", ADDR_A)]);

        let frame = json!({
            "channel": "userFills",
            "data": {
                "user": ADDR_A.to_lowercase(),
                "fills": [{
                    "coin": "BTC", "px": "50000", "sz": "0.1", "time": 1700000000000u64,
                    "dir": "Open Long", "closedPnl": "0"
                }]
            }
        });
        manager.handle_text_message(&frame.to_string()).await;

        let labeled = fill_rx.try_recv().unwrap();
        assert_eq!(labeled.label, "A");
        assert!(fill_rx.try_recv().is_err(), "exactly one fill dispatched");
    }

    #[tokio::test]
    async fn test_subscription_response_not_dispatched() {
        let (fill_tx, mut fill_rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(ConnectionConfig::default(), fill_tx);

        let frame = json!({
            "channel": "subscriptionResponse",
            "data": {"method": "subscribe", "subscription": {"type": "userFills", "user": ADDR_A}}
        });
        manager.handle_text_message(&frame.to_string()).await;

        assert!(fill_rx.try_recv().is_err());
        assert!(manager.subscriptions.is_acked(ADDR_A));
    }

    #[tokio::test]
    async fn test_shutdown_before_connect_returns_ok() {
        let (fill_tx, _fill_rx) = mpsc::channel(8);
        let manager = ConnectionManager::new(ConnectionConfig::default(), fill_tx);

        manager.shutdown();
        assert!(manager.connect().await.is_ok());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}
