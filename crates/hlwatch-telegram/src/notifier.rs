//! Fill notification delivery.
//!
//! Delivery is best-effort: callers spawn the returned future and only log
//! the [`DeliveryOutcome`]. There is no retry and no queue.

use crate::client::TelegramClient;
use crate::types::ParseMode;
use hlwatch_core::FillEvent;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of delivering one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Sink for fill notifications.
pub trait Notifier: Send + Sync {
    /// Deliver a notification for `fill` on the account labelled `label`.
    fn notify(&self, fill: &FillEvent, label: &str) -> BoxFuture<'_, DeliveryOutcome>;
}

/// Arc wrapper for Notifier trait objects.
pub type DynNotifier = Arc<dyn Notifier>;

/// Render the Markdown notification text for a fill.
pub fn format_fill_message(fill: &FillEvent, label: &str) -> String {
    let position = fill
        .position_value()
        .map(|v| format!("{v:.2}$"))
        .unwrap_or_else(|| "n/a".to_string());
    let time = fill
        .timestamp()
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "Fill Event: 📈\n\
         Coin: {coin} 💰\n\
         Type: {dir} ↔️\n\
         Price: {px} 💸\n\
         Position: {position} 📏\n\
         Time: {time} ⏰\n\
         Pnl: {pnl}$ 📈\n\
         Label: *{label}*",
        coin = fill.coin,
        dir = fill.dir,
        px = fill.px,
        pnl = fill.closed_pnl,
    )
}

/// Delivers fill notifications to a single Telegram chat.
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            chat_id: chat_id.into(),
        }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, fill: &FillEvent, label: &str) -> BoxFuture<'_, DeliveryOutcome> {
        let text = format_fill_message(fill, label);
        let coin = fill.coin.clone();
        let label = label.to_string();

        Box::pin(async move {
            match self
                .client
                .send_message(&self.chat_id, &text, Some(ParseMode::Markdown))
                .await
            {
                Ok(_) => {
                    debug!(%label, %coin, "Fill notification delivered");
                    DeliveryOutcome::Delivered
                }
                Err(e) => {
                    warn!(%label, %coin, error = %e, "Fill notification failed");
                    DeliveryOutcome::Failed(e.to_string())
                }
            }
        })
    }
}

/// Mock notifier for testing.
#[derive(Debug)]
pub struct MockNotifier {
    /// Recorded (fill, label) pairs for verification.
    calls: Mutex<Vec<(FillEvent, String)>>,
    /// Outcome returned for every call.
    outcome: Mutex<DeliveryOutcome>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Mutex::new(DeliveryOutcome::Delivered),
        }
    }

    /// Set the outcome returned by subsequent calls.
    pub fn set_outcome(&self, outcome: DeliveryOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Get recorded calls.
    pub fn calls(&self) -> Vec<(FillEvent, String)> {
        self.calls.lock().clone()
    }

    /// Rendered text of each recorded call.
    pub fn messages(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|(fill, label)| format_fill_message(fill, label))
            .collect()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, fill: &FillEvent, label: &str) -> BoxFuture<'_, DeliveryOutcome> {
        let call = (fill.clone(), label.to_string());
        Box::pin(async move {
            self.calls.lock().push(call);
            self.outcome.lock().clone()
        })
    }
}
