//! Subscription tracking for the current connection.
//!
//! Records which `userFills` subscriptions were sent on the live socket and
//! which of them the server acknowledged. Everything is cleared on
//! reconnect, since a fresh connection starts with no subscriptions.

use crate::message::{extract_subscription_type, extract_subscription_user, USER_FILLS};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Subscription manager.
#[derive(Default)]
pub struct SubscriptionManager {
    /// Active subscriptions: lowercase address -> address as sent.
    active: RwLock<HashMap<String, String>>,
    /// Lowercase addresses whose subscribe was acknowledged.
    acked: RwLock<HashSet<String>>,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscribe request sent for `address`.
    pub fn add_subscription(&self, address: &str) {
        self.active
            .write()
            .insert(address.to_ascii_lowercase(), address.to_string());
    }

    /// Record an unsubscribe request sent for `address`.
    pub fn remove_subscription(&self, address: &str) {
        let key = address.to_ascii_lowercase();
        self.active.write().remove(&key);
        self.acked.write().remove(&key);
    }

    /// Subscribed addresses (as sent) that are not in `current`.
    ///
    /// `current` holds lowercase addresses of the new watch-list.
    pub fn stale(&self, current: &HashSet<String>) -> Vec<String> {
        let mut stale: Vec<String> = self
            .active
            .read()
            .iter()
            .filter(|(key, _)| !current.contains(*key))
            .map(|(_, sent)| sent.clone())
            .collect();
        stale.sort();
        stale
    }

    /// Handle subscriptionResponse data.
    ///
    /// Returns `true` if a userFills subscribe ACK was recorded.
    pub fn handle_ack(&self, data: &serde_json::Value) -> bool {
        // Only subscribe ACKs count (not unsubscribe/error)
        let is_subscribe = data
            .get("method")
            .and_then(|v| v.as_str())
            .is_some_and(|m| m == "subscribe");

        if !is_subscribe || extract_subscription_type(data) != Some(USER_FILLS) {
            return false;
        }

        let Some(user) = extract_subscription_user(data) else {
            return false;
        };

        let key = user.to_ascii_lowercase();
        if self.acked.write().insert(key) {
            info!(user = %user, "userFills subscription confirmed");
        } else {
            debug!(user = %user, "Duplicate userFills subscription ACK");
        }
        true
    }

    /// Check whether the server confirmed the subscription for `address`.
    pub fn is_acked(&self, address: &str) -> bool {
        self.acked.read().contains(&address.to_ascii_lowercase())
    }

    /// Reset state (called on reconnection).
    pub fn reset(&self) {
        self.active.write().clear();
        self.acked.write().clear();
        debug!("Subscription state reset");
    }

    /// Get list of active subscriptions (addresses as sent, sorted).
    pub fn active_subscriptions(&self) -> Vec<String> {
        let mut subs: Vec<String> = self.active.read().values().cloned().collect();
        subs.sort();
        subs
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.active.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_and_remove() {
        let subs = SubscriptionManager::new();
        subs.add_subscription("0xAB");
        subs.add_subscription("0xab");
        assert_eq!(subs.len(), 1, "keyed case-insensitively");
        assert_eq!(subs.active_subscriptions(), vec!["0xab".to_string()]);

        subs.remove_subscription("0xAB");
        assert!(subs.is_empty());
    }

    #[test]
    fn test_stale() {
        let subs = SubscriptionManager::new();
        subs.add_subscription("0xAA");
        subs.add_subscription("0xbb");

        let current: HashSet<String> = ["0xaa".to_string()].into_iter().collect();
        assert_eq!(subs.stale(&current), vec!["0xbb".to_string()]);

        let empty = HashSet::new();
        assert_eq!(subs.stale(&empty).len(), 2);
    }

    #[test]
    fn test_handle_ack_official_format() {
        let subs = SubscriptionManager::new();
        let data = json!({
            "method": "subscribe",
            "subscription": {"type": "userFills", "user": "0xABCD"}
        });

        assert!(subs.handle_ack(&data));
        assert!(subs.is_acked("0xabcd"));
    }

    #[test]
    fn test_handle_ack_unsubscribe_ignored() {
        let subs = SubscriptionManager::new();
        let data = json!({
            "method": "unsubscribe",
            "subscription": {"type": "userFills", "user": "0x1234"}
        });

        assert!(!subs.handle_ack(&data));
        assert!(!subs.is_acked("0x1234"));
    }

    #[test]
    fn test_handle_ack_other_type_ignored() {
        let subs = SubscriptionManager::new();
        let data = json!({"method": "subscribe", "subscription": {"type": "allMids"}});
        assert!(!subs.handle_ack(&data));
    }

    #[test]
    fn test_reset() {
        let subs = SubscriptionManager::new();
        subs.add_subscription("0x1");
        subs.handle_ack(&json!({
            "method": "subscribe",
            "subscription": {"type": "userFills", "user": "0x1"}
        }));

        subs.reset();
        assert!(subs.is_empty());
        assert!(!subs.is_acked("0x1"));
    }
}
