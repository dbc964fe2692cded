// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for LGN circuit operations

use crate::integrator::GridSignature;

/// Errors raised while configuring or evaluating an LGN circuit.
///
/// Every variant is raised at the call that introduces the invalid state.
/// Runaway feedback is *not* an error; see the solver diagnostics instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LgnError {
    /// Grid unset, foreign node handle, invalid kernel parameter, ...
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stimulus or cached array evaluated against a grid it was not built for
    #[error("Dimension mismatch: expected grid {expected}, got {actual}")]
    DimensionMismatch {
        expected: GridSignature,
        actual: GridSignature,
    },

    /// A frequency that must lie on a grid axis does not
    #[error("Dimension mismatch: {axis} value {value} is not on the {axis} grid")]
    OffGrid { axis: &'static str, value: f64 },
}

impl LgnError {
    pub fn config(msg: impl Into<String>) -> Self {
        LgnError::Configuration(msg.into())
    }

    /// True for every dimension-mismatch flavour.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            LgnError::DimensionMismatch { .. } | LgnError::OffGrid { .. }
        )
    }
}

pub type Result<T> = core::result::Result<T, LgnError>;
pub type Error = LgnError;

/// Reject negative or non-finite shape parameters.
pub(crate) fn ensure_non_negative(kernel: &str, name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(LgnError::config(format!(
            "{kernel}: parameter `{name}` must be finite and non-negative (got {value})"
        )));
    }
    Ok(())
}

/// Reject non-finite parameters that may legitimately be negative (shifts, weights).
pub(crate) fn ensure_finite(kernel: &str, name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(LgnError::config(format!(
            "{kernel}: parameter `{name}` must be finite (got {value})"
        )));
    }
    Ok(())
}
