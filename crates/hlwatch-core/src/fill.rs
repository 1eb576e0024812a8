//! Trade fills from the `userFills` feed.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Decimal places used for the position value.
const POSITION_VALUE_DP: u32 = 2;

/// A single trade execution on a watched account.
///
/// Only the fields the notifier renders are required; any other fields
/// the exchange sends (`side`, `tid`, `fee`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    /// Coin symbol (e.g., "BTC").
    pub coin: String,
    /// Fill price, as sent by the exchange.
    pub px: String,
    /// Fill size.
    pub sz: String,
    /// Fill timestamp (milliseconds since epoch).
    pub time: u64,
    /// Direction (e.g., "Open Long", "Close Short").
    pub dir: String,
    /// Realized PnL.
    #[serde(rename = "closedPnl")]
    pub closed_pnl: String,
}

impl FillEvent {
    /// Notional value of the fill (`sz * px`) rounded to 2 decimal places.
    ///
    /// Returns `None` if either field is not a decimal number.
    pub fn position_value(&self) -> Option<Decimal> {
        let px = Decimal::from_str(&self.px).ok()?;
        let sz = Decimal::from_str(&self.sz).ok()?;
        let value = px.checked_mul(sz)?;
        Some(value.round_dp_with_strategy(POSITION_VALUE_DP, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Fill time as a UTC timestamp.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.time)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

/// A fill matched to a watch-list entry, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFill {
    pub fill: FillEvent,
    /// Label of the matching watch-list entry.
    pub label: String,
    /// Address as reported by the exchange.
    pub user: String,
}
