//! Structured logging for the hlwatch fill relay.
//!
//! JSON lines in production (`RUST_ENV=production`), pretty output otherwise.
//! Verbosity follows `RUST_LOG`, defaulting to `info,hlwatch=debug`.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, DEFAULT_FILTER};
