//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,hlwatch=debug";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// JSON when `rust_env` is "production", pretty otherwise.
    pub fn from_rust_env(rust_env: Option<&str>) -> Self {
        match rust_env {
            Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Build the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
fn build_filter(rust_log: Option<&str>) -> TelemetryResult<EnvFilter> {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| TelemetryError::InvalidFilter(format!("{directives}: {e}"))),
        _ => Ok(EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Initialize structured logging.
///
/// Configures tracing with JSON output for production and
/// pretty output for development. Fails if a global subscriber is
/// already installed or `RUST_LOG` does not parse.
pub fn init_logging() -> TelemetryResult<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = build_filter(rust_log.as_deref())?;
    let format = LogFormat::from_rust_env(std::env::var("RUST_ENV").ok().as_deref());

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
