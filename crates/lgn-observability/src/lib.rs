// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # lgn-observability
//!
//! Logging infrastructure shared by the LGN binaries: a `tracing-subscriber`
//! registry with an `EnvFilter` driven by per-crate debug flags, rendering
//! either human-readable text or JSON lines.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Workspace crates that accept a `--debug-<crate>` flag
pub const KNOWN_CRATES: &[&str] = &["lgn", "lgn-engine", "lgn-neural", "lgn-config"];
