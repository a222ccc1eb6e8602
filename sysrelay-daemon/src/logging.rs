//! Logging initialization for sysrelay-daemon.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `SysrelayConfig`. Supports JSON structured logging and
//! human-readable pretty format.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sysrelay_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called once, before the orchestrator is built.
/// `RUST_LOG` takes precedence over `[general] log_level`.
///
/// # Formats
///
/// * `"json"` - one JSON object per line (default, for journald/collectors)
/// * `"pretty"` - multi-line human-readable output (for foreground runs)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.log_level)?,
    };

    let format_layer = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer().pretty().boxed(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            ));
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(format_layer)
        .try_init()
        .map_err(|e| {
            anyhow::anyhow!(
                "failed to initialize {} tracing subscriber: {}",
                config.log_format,
                e
            )
        })
}

/// Build the filter used when `RUST_LOG` is not set.
///
/// `log_level` may be a bare level (`info`) or a full directive list
/// (`info,sysrelay_relay_pipeline=debug`).
pub fn build_filter(log_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(log_level)
        .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", log_level, e))
}
