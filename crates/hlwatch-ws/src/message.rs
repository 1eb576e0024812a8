//! WebSocket message types.

use hlwatch_core::FillEvent;
use serde::{Deserialize, Serialize};

/// Subscription type used for fill notifications.
pub const USER_FILLS: &str = "userFills";

/// Channel carrying subscribe/unsubscribe acknowledgements.
pub const SUBSCRIPTION_RESPONSE: &str = "subscriptionResponse";

// ============================================================================
// User Fills (Incoming) - fill notifications
// ============================================================================

/// userFills payload from Hyperliquid.
/// Format: { "isSnapshot"?: bool, "user": string, "fills": [WsFill, ...] }
/// Note: isSnapshot is only present in the initial snapshot message.
#[derive(Debug, Clone, Deserialize)]
pub struct UserFillsPayload {
    /// True for initial snapshot. Missing (defaults to false) for streaming updates.
    #[serde(rename = "isSnapshot", default)]
    pub is_snapshot: bool,
    /// User address the fills belong to.
    pub user: String,
    /// Raw fill elements; parsed one by one so a bad element doesn't drop the batch.
    #[serde(default)]
    pub fills: Vec<serde_json::Value>,
}

/// Result of parsing the fills of one batch.
#[derive(Debug, Clone, Default)]
pub struct UserFillsResult {
    /// Successfully parsed fills, in feed order.
    pub fills: Vec<FillEvent>,
    /// Number of elements that failed to parse.
    pub failed_count: usize,
}

impl UserFillsPayload {
    /// Parse every fill element, skipping (and counting) malformed ones.
    pub fn parse_fills(&self) -> UserFillsResult {
        let mut fills = Vec::with_capacity(self.fills.len());
        let mut failed_count = 0;

        for v in &self.fills {
            match serde_json::from_value::<FillEvent>(v.clone()) {
                Ok(fill) => fills.push(fill),
                Err(e) => {
                    tracing::debug!(error = %e, element = ?v, "Failed to parse fill element");
                    failed_count += 1;
                }
            }
        }

        UserFillsResult {
            fills,
            failed_count,
        }
    }
}

// ============================================================================
// Subscription Response Helpers
// ============================================================================

/// Extract subscription type from subscriptionResponse data.
///
/// Handles both formats:
/// - Official: `data.subscription.type`
/// - Fallback: `data.type`
pub fn extract_subscription_type(data: &serde_json::Value) -> Option<&str> {
    data.get("subscription")
        .and_then(|s| s.get("type"))
        .and_then(|v| v.as_str())
        .or_else(|| data.get("type").and_then(|v| v.as_str()))
}

/// Extract the subscribed user from subscriptionResponse data.
pub fn extract_subscription_user(data: &serde_json::Value) -> Option<&str> {
    data.get("subscription")
        .and_then(|s| s.get("user"))
        .and_then(|v| v.as_str())
        .or_else(|| data.get("user").and_then(|v| v.as_str()))
}

// ============================================================================
// Core WebSocket Messages
// ============================================================================

/// Incoming WebSocket message wrapper.
///
/// All messages from the Hyperliquid WebSocket use channel-based format.
/// The `channel` field determines the message type:
/// - "pong": Heartbeat response
/// - "subscriptionResponse": Subscription confirmation
/// - "userFills": Fill notifications
/// - "error": Server-side error report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WsMessage {
    /// Pong response (no data field, just channel: "pong").
    Pong(PongMessage),
    /// Channel-based message (all other messages with data field).
    Channel(ChannelMessage),
}

impl WsMessage {
    /// Check if this is a pong message.
    pub fn is_pong(&self) -> bool {
        matches!(self, Self::Pong(p) if p.is_pong())
    }

    /// Get the channel name.
    pub fn channel(&self) -> &str {
        match self {
            Self::Pong(p) => &p.channel,
            Self::Channel(c) => &c.channel,
        }
    }

    /// Check if this is a subscription acknowledgement.
    pub fn is_subscription_response(&self) -> bool {
        matches!(self, Self::Channel(c) if c.channel == SUBSCRIPTION_RESPONSE)
    }

    /// Check if this is a user fills message.
    pub fn is_user_fills(&self) -> bool {
        matches!(self, Self::Channel(c) if c.channel == USER_FILLS)
    }

    /// Try to parse as userFills payload.
    /// Returns the full UserFillsPayload with isSnapshot flag and raw fills.
    pub fn as_user_fills(&self) -> Option<UserFillsPayload> {
        match self {
            Self::Channel(c) if c.channel == USER_FILLS => {
                serde_json::from_value(c.data.clone()).ok()
            }
            _ => None,
        }
    }
}

/// Channel-based message from a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Channel identifier (e.g., "userFills", "subscriptionResponse").
    pub channel: String,
    /// Message data (flexible JSON).
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Pong response message (Hyperliquid format: {"channel": "pong"}).
/// Uses deny_unknown_fields to distinguish from ChannelMessage in untagged enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PongMessage {
    pub channel: String,
}

impl PongMessage {
    pub fn is_pong(&self) -> bool {
        self.channel == "pong"
    }
}

/// Outgoing request to WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsRequest {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<serde_json::Value>,
}

impl WsRequest {
    /// Create a ping request.
    pub fn ping() -> Self {
        Self {
            method: "ping".to_string(),
            subscription: None,
        }
    }

    /// Create a subscribe request.
    pub fn subscribe(subscription: serde_json::Value) -> Self {
        Self {
            method: "subscribe".to_string(),
            subscription: Some(subscription),
        }
    }

    /// Create an unsubscribe request.
    pub fn unsubscribe(subscription: serde_json::Value) -> Self {
        Self {
            method: "unsubscribe".to_string(),
            subscription: Some(subscription),
        }
    }

    /// Subscribe to fills for one user.
    pub fn subscribe_user_fills(user: &str) -> Self {
        Self::subscribe(user_fills_subscription(user))
    }

    /// Unsubscribe from fills for one user.
    pub fn unsubscribe_user_fills(user: &str) -> Self {
        Self::unsubscribe(user_fills_subscription(user))
    }
}

fn user_fills_subscription(user: &str) -> serde_json::Value {
    serde_json::json!({
        "type": USER_FILLS,
        "user": user
    })
}
