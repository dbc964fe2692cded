// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `lgn_configuration.toml`. Every field has a
//! default, so a partial (or empty) file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LgnConfig {
    pub integrator: IntegratorConfig,
    pub solver: SolverConfig,
    pub logging: LoggingConfig,
}

/// Integration grid parameters
///
/// `nt` and `nr` are exponents: the grid holds `2^nt` temporal samples and
/// `2^nr` samples per spatial axis.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub nt: u32,
    pub nr: u32,
    /// Temporal step
    pub dt: f64,
    /// Spatial step
    pub dr: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            nt: 1,
            nr: 7,
            dt: 1.0,
            dr: 0.1,
        }
    }
}

/// Transfer-function solver settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    /// `|det(I - M)|` below this flags a grid point as near-singular
    pub singularity_tolerance: f64,
    /// Solve grid points on the rayon thread pool
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            singularity_tolerance: 1e-3,
            parallel: true,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
