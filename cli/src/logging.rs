//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level`, falling back to the `HQ_LOG`
//! environment variable (both handled by the argument parser), then `warn`.
//! Logs are written to STDERR so that stdout carries nothing but replies to
//! the operator.

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt;

use crate::arg_parser::LogLevel;

/// Install the global subscriber. Call once at startup.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let level = level.map(tracing::Level::from).unwrap_or(tracing::Level::WARN);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
