//! Liveness probing for the feed connection.
//!
//! Sends are driven by the connection's message loop; this type only
//! decides the cadence and keeps ping/pong bookkeeping. There is no pong
//! timeout: dead connections are detected by the transport closing.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Heartbeat manager for WebSocket connection health.
pub struct HeartbeatManager {
    /// Ping interval.
    interval: Duration,
    /// Last ping sent time.
    last_ping: RwLock<Option<DateTime<Utc>>>,
    /// Last pong received time.
    last_pong: RwLock<Option<DateTime<Utc>>>,
    /// Last message received time (any message).
    last_message: RwLock<Option<DateTime<Utc>>>,
    /// Pings sent on the current connection.
    pings_sent: RwLock<u64>,
}

impl HeartbeatManager {
    /// Create a new heartbeat manager.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            last_ping: RwLock::new(None),
            last_pong: RwLock::new(None),
            last_message: RwLock::new(None),
            pings_sent: RwLock::new(0),
        }
    }

    /// Ping interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Build the ping ticker for a freshly opened connection.
    ///
    /// The first tick fires one full interval after open. The ticker is
    /// owned by the message loop, so it stops as soon as that loop exits.
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Reset heartbeat state (called on connection).
    pub fn reset(&self) {
        *self.last_ping.write() = None;
        *self.last_pong.write() = None;
        *self.last_message.write() = None;
        *self.pings_sent.write() = 0;
    }

    /// Record that a ping was sent.
    pub fn record_ping(&self) {
        let now = Utc::now();
        *self.last_ping.write() = Some(now);
        *self.pings_sent.write() += 1;
        debug!(time = %now, "Sent ping");
    }

    /// Record that a pong was received.
    pub fn record_pong(&self) {
        let now = Utc::now();
        *self.last_pong.write() = Some(now);

        if let Some(ping_time) = *self.last_ping.read() {
            let rtt_ms = (now - ping_time).num_milliseconds();
            debug!(rtt_ms, "Received pong");
        }
    }

    /// Record that any message was received.
    pub fn record_message(&self) {
        *self.last_message.write() = Some(Utc::now());
    }

    /// Get heartbeat statistics.
    pub fn stats(&self) -> HeartbeatStats {
        HeartbeatStats {
            last_ping: *self.last_ping.read(),
            last_pong: *self.last_pong.read(),
            last_message: *self.last_message.read(),
            pings_sent: *self.pings_sent.read(),
        }
    }
}

/// Heartbeat statistics.
#[derive(Debug, Clone)]
pub struct HeartbeatStats {
    pub last_ping: Option<DateTime<Utc>>,
    pub last_pong: Option<DateTime<Utc>>,
    pub last_message: Option<DateTime<Utc>>,
    pub pings_sent: u64,
}
