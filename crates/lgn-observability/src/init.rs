// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Installs a global `tracing` subscriber writing to stderr. `RUST_LOG`, when
//! set, replaces the filter built from the debug flags.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::LogFormat;

/// Build the filter for `debug_flags` on top of `default_level`.
pub fn build_filter(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = debug_flags.to_filter_string(default_level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {directives}"))
}

/// Initialize the global subscriber.
///
/// # Errors
/// Fails if the filter is invalid or a global subscriber is already installed.
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    format: LogFormat,
    default_level: &str,
) -> Result<()> {
    let env_filter = build_filter(debug_flags, default_level)?;

    let layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .boxed(),
    };

    Registry::default()
        .with(layer.with_filter(env_filter))
        .try_init()
        .context("Failed to install global tracing subscriber")
}

/// Initialize with text output at `info`
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<()> {
    init_logging(debug_flags, LogFormat::Text, "info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_flags() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let flags = CrateDebugFlags::from_args(vec!["--debug-lgn-engine".to_string()]);
        let filter = build_filter(&flags, "warn").unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("lgn_engine=debug"), "{rendered}");
    }
}
