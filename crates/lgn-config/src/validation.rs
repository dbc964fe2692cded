// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every problem is collected and reported together rather than stopping at the
//! first one.

use crate::{ConfigError, ConfigResult, LgnConfig};

/// Largest accepted `integrator.nt`
pub const MAX_NT: u32 = 14;

/// Largest accepted `integrator.nr`
pub const MAX_NR: u32 = 12;

/// Largest accepted `integrator.nt + 2 * integrator.nr` (total grid points)
pub const MAX_GRID_EXPONENT: u32 = 24;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: String, range: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { field, value, range } => {
                write!(f, "{field} = {value} is outside valid range {range}")
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {field}: {reason}")
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Grid exponents within the supported FFT sizes
/// - Strictly positive, finite grid steps
/// - Non-negative, finite solver tolerance
/// - Known log level and format
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &LgnConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_integrator(config, &mut errors);
    validate_solver(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {e}"))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{error_messages}"
        )));
    }

    Ok(())
}

fn validate_integrator(config: &LgnConfig, errors: &mut Vec<ConfigValidationError>) {
    let grid = &config.integrator;
    if grid.nt > MAX_NT {
        errors.push(ConfigValidationError::OutOfRange {
            field: "integrator.nt".to_string(),
            value: grid.nt.to_string(),
            range: format!("0..={MAX_NT}"),
        });
    }
    if grid.nr > MAX_NR {
        errors.push(ConfigValidationError::OutOfRange {
            field: "integrator.nr".to_string(),
            value: grid.nr.to_string(),
            range: format!("0..={MAX_NR}"),
        });
    }
    let grid_exponent = grid.nt.saturating_add(grid.nr.saturating_mul(2));
    if grid_exponent > MAX_GRID_EXPONENT {
        errors.push(ConfigValidationError::OutOfRange {
            field: "integrator.nt + 2 * integrator.nr".to_string(),
            value: grid_exponent.to_string(),
            range: format!("0..={MAX_GRID_EXPONENT}"),
        });
    }
    for (field, step) in [("integrator.dt", grid.dt), ("integrator.dr", grid.dr)] {
        if !step.is_finite() || step <= 0.0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: format!("must be finite and > 0 (got {step})"),
            });
        }
    }
}

fn validate_solver(config: &LgnConfig, errors: &mut Vec<ConfigValidationError>) {
    let tol = config.solver.singularity_tolerance;
    if !tol.is_finite() || tol < 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "solver.singularity_tolerance".to_string(),
            reason: format!("must be finite and >= 0 (got {tol})"),
        });
    }
}

fn validate_logging(config: &LgnConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {LOG_LEVELS:?}", config.logging.level),
        });
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!("'{}' is not one of {LOG_FORMATS:?}", config.logging.format),
        });
    }
}
