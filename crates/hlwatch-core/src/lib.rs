//! Core domain types for the hlwatch fill relay.
//!
//! This crate provides the types shared by the feed client, the notifier
//! and the command interface:
//! - `Address`: Validated Hyperliquid account address
//! - `AddressEntry`, `WatchList`: Labelled addresses being monitored
//! - `FillEvent`, `LabeledFill`: Trade fills as delivered by the `userFills` feed

pub mod address;
pub mod error;
pub mod fill;
pub mod watch_list;

pub use address::Address;
pub use error::{CoreError, Result};
pub use fill::{FillEvent, LabeledFill};
pub use watch_list::{distinct_addresses, find_by_address, AddressEntry, WatchList};
