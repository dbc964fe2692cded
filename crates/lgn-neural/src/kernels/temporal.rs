// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Temporal Kernels
//!
//! Closed-form Fourier transforms of causal temporal filters.
//!
//! ```text
//! delta(d):                exp(-iwd)
//! exp_decay(tau, d):       exp(-iwd) / (1 + iw·tau)
//! biphasic(T, zeta, d):    exp(-iwd) · π (1 + e^{-iwT}) (1 - zeta·e^{-iwT}) / (π² - w²T²)
//! ```
//!
//! The biphasic filter is the transform of
//!
//! ```text
//!     sin(πt/T) / T                  0 <= t <= T
//!   - zeta · sin(π(t - T)/T) / T     T <  t <= 2T
//! ```
//!
//! i.e. a positive lobe followed by a damped negative rebound.

use core::f64::consts::PI;

use num_complex::Complex64;

use super::KernelShape;
use crate::error::{ensure_non_negative, LgnError, Result};
use crate::integrator::Integrator;

/// Relative distance from the biphasic pole below which the analytic limit is used
const BIPHASIC_POLE_TOLERANCE: f64 = 1e-9;

/// Temporal filter, evaluated at angular frequency `w`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemporalKernel {
    Delta {
        delay: f64,
    },
    ExponentialDecay {
        tau: f64,
        delay: f64,
    },
    Biphasic {
        phase_duration: f64,
        damping: f64,
        delay: f64,
    },
}

impl TemporalKernel {
    /// Identity pass-through
    pub fn delta() -> Self {
        TemporalKernel::Delta { delay: 0.0 }
    }

    /// Pure delay line
    pub fn delta_delayed(delay: f64) -> Result<Self> {
        ensure_non_negative("delta", "delay", delay)?;
        Ok(TemporalKernel::Delta { delay })
    }

    /// First-order low-pass with time constant `tau` and a pure delay
    pub fn exponential_decay(tau: f64, delay: f64) -> Result<Self> {
        ensure_non_negative("exponential_decay", "tau", tau)?;
        ensure_non_negative("exponential_decay", "delay", delay)?;
        Ok(TemporalKernel::ExponentialDecay { tau, delay })
    }

    /// Damped biphasic filter (phase duration `T`, rebound damping `zeta`)
    pub fn biphasic(phase_duration: f64, damping: f64, delay: f64) -> Result<Self> {
        ensure_non_negative("biphasic", "phase_duration", phase_duration)?;
        ensure_non_negative("biphasic", "damping", damping)?;
        ensure_non_negative("biphasic", "delay", delay)?;
        Ok(TemporalKernel::Biphasic {
            phase_duration,
            damping,
            delay,
        })
    }

    /// Build from a named shape and its positional parameters.
    ///
    /// - `Delta`: `[]` or `[delay]`
    /// - `ExponentialDecay`: `[tau, delay]`
    /// - `Biphasic`: `[phase_duration, damping, delay]`
    pub fn from_shape(shape: KernelShape, params: &[f64]) -> Result<Self> {
        match (shape, params) {
            (KernelShape::Delta, []) => Ok(Self::delta()),
            (KernelShape::Delta, &[delay]) => Self::delta_delayed(delay),
            (KernelShape::ExponentialDecay, &[tau, delay]) => Self::exponential_decay(tau, delay),
            (KernelShape::Biphasic, &[t, zeta, delay]) => Self::biphasic(t, zeta, delay),
            (KernelShape::Gaussian | KernelShape::DifferenceOfGaussians, _) => Err(
                LgnError::config(format!("{shape} is a spatial shape, not a temporal one")),
            ),
            _ => Err(LgnError::config(format!(
                "{shape}: unexpected parameter count {}",
                params.len()
            ))),
        }
    }

    pub fn shape(&self) -> KernelShape {
        match self {
            TemporalKernel::Delta { .. } => KernelShape::Delta,
            TemporalKernel::ExponentialDecay { .. } => KernelShape::ExponentialDecay,
            TemporalKernel::Biphasic { .. } => KernelShape::Biphasic,
        }
    }

    pub fn delay(&self) -> f64 {
        match *self {
            TemporalKernel::Delta { delay }
            | TemporalKernel::ExponentialDecay { delay, .. }
            | TemporalKernel::Biphasic { delay, .. } => delay,
        }
    }

    /// Complex gain at angular frequency `w`
    #[inline]
    pub fn gain(&self, w: f64) -> Complex64 {
        let delay = self.delay();
        let phase = if delay == 0.0 {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::from_polar(1.0, -w * delay)
        };
        match *self {
            TemporalKernel::Delta { .. } => phase,
            TemporalKernel::ExponentialDecay { tau, .. } => {
                phase / Complex64::new(1.0, w * tau)
            }
            TemporalKernel::Biphasic {
                phase_duration,
                damping,
                ..
            } => phase * biphasic_core(w, phase_duration, damping),
        }
    }

    /// Gain sampled on the temporal frequency axis (FFT order).
    pub fn sample(&self, grid: &Integrator) -> Vec<Complex64> {
        grid.temporal_freqs().iter().map(|&w| self.gain(w)).collect()
    }
}

impl Default for TemporalKernel {
    fn default() -> Self {
        Self::delta()
    }
}

/// Biphasic transform without the delay factor
fn biphasic_core(w: f64, t: f64, zeta: f64) -> Complex64 {
    let wt = w * t;
    let e = Complex64::from_polar(1.0, -wt);
    let rebound = Complex64::new(1.0, 0.0) - zeta * e;
    let denom = PI * PI - wt * wt;

    if denom.abs() < BIPHASIC_POLE_TOLERANCE * PI * PI {
        // removable singularity at |wT| = π
        let lobe = Complex64::new(0.0, -0.5 * w.signum());
        return lobe * (1.0 + zeta);
    }

    PI * (Complex64::new(1.0, 0.0) + e) * rebound / denom
}
