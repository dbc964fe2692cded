// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Integration Grid
//!
//! The discretised space-time domain every kernel, stimulus and response is
//! evaluated on.
//!
//! ## Fourier Convention
//! ```text
//! Forward:  F(k, w) = ∫ f(x, t) exp(-i(k·x + w t)) dx dt
//! Inverse:  f(x, t) = (2π)^-3 ∫ F(k, w) exp(+i(k·x + w t)) dk dw
//!
//! Discrete inverse:
//!     f = IFFT_unnormalised(F) / (Nt · Nr² · dt · dr²)
//! ```
//!
//! Frequency axes are stored in FFT order (index 0 is DC, negative frequencies
//! in the upper half). Positions are centred: index `Nr/2` is the origin.

use core::f64::consts::PI;
use core::fmt;

use crate::error::{LgnError, Result};

/// Largest accepted temporal exponent (`Nt = 2^14`)
pub const MAX_TEMPORAL_EXPONENT: u32 = 14;

/// Largest accepted spatial exponent (`Nr = 2^12` per axis)
pub const MAX_SPATIAL_EXPONENT: u32 = 12;

/// Largest accepted `nt + 2·nr`: at most `2^24` grid points, each holding one
/// complex value per node once solved
pub const MAX_GRID_EXPONENT: u32 = 24;

/// Relative tolerance used when snapping a frequency onto a grid axis
const GRID_SNAP_TOLERANCE: f64 = 1e-6;

/// Identity of a grid, used to detect arrays built against another grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSignature {
    pub nt: u32,
    pub nr: u32,
    pub dt: f64,
    pub dr: f64,
}

impl fmt::Display for GridSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(nt={}, nr={}, dt={}, dr={})",
            self.nt, self.nr, self.dt, self.dr
        )
    }
}

/// Discretised spatiotemporal grid (the "integrator")
///
/// Immutable once created. `Nt = 2^nt` temporal samples with step `dt`,
/// `Nr = 2^nr` samples along each spatial axis with step `dr`.
#[derive(Debug, Clone, PartialEq)]
pub struct Integrator {
    signature: GridSignature,
    times: Vec<f64>,
    positions: Vec<f64>,
    temporal_freqs: Vec<f64>,
    spatial_freqs: Vec<f64>,
}

impl Integrator {
    /// Create a grid from the exponents `nt`, `nr` and the steps `dt`, `dr`.
    ///
    /// # Errors
    /// `LgnError::Configuration` if an exponent exceeds its maximum, the grid
    /// would hold more than `2^MAX_GRID_EXPONENT` points, or a step is not
    /// finite and strictly positive.
    pub fn new(nt: u32, nr: u32, dt: f64, dr: f64) -> Result<Self> {
        if nt > MAX_TEMPORAL_EXPONENT {
            return Err(LgnError::config(format!(
                "Integrator: nt={nt} exceeds maximum exponent {MAX_TEMPORAL_EXPONENT}"
            )));
        }
        if nr > MAX_SPATIAL_EXPONENT {
            return Err(LgnError::config(format!(
                "Integrator: nr={nr} exceeds maximum exponent {MAX_SPATIAL_EXPONENT}"
            )));
        }
        if nt + 2 * nr > MAX_GRID_EXPONENT {
            return Err(LgnError::config(format!(
                "Integrator: 2^(nt + 2·nr) = 2^{} grid points exceeds 2^{MAX_GRID_EXPONENT}",
                nt + 2 * nr
            )));
        }
        for (name, step) in [("dt", dt), ("dr", dr)] {
            if !step.is_finite() || step <= 0.0 {
                return Err(LgnError::config(format!(
                    "Integrator: {name} must be finite and > 0 (got {step})"
                )));
            }
        }

        let n_t = 1usize << nt;
        let n_r = 1usize << nr;

        let times = (0..n_t).map(|n| n as f64 * dt).collect();
        let half = (n_r / 2) as f64;
        let positions = (0..n_r).map(|j| (j as f64 - half) * dr).collect();
        let temporal_freqs = fft_angular_freqs(n_t, dt);
        let spatial_freqs = fft_angular_freqs(n_r, dr);

        Ok(Self {
            signature: GridSignature { nt, nr, dt, dr },
            times,
            positions,
            temporal_freqs,
            spatial_freqs,
        })
    }

    pub fn signature(&self) -> GridSignature {
        self.signature
    }

    /// Number of temporal samples `Nt`
    pub fn nt(&self) -> usize {
        self.times.len()
    }

    /// Number of samples along each spatial axis `Nr`
    pub fn nr(&self) -> usize {
        self.positions.len()
    }

    pub fn dt(&self) -> f64 {
        self.signature.dt
    }

    pub fn dr(&self) -> f64 {
        self.signature.dr
    }

    /// Temporal angular-frequency step `2π / (Nt·dt)`
    pub fn dw(&self) -> f64 {
        2.0 * PI / (self.nt() as f64 * self.dt())
    }

    /// Spatial wavenumber step `2π / (Nr·dr)`
    pub fn dk(&self) -> f64 {
        2.0 * PI / (self.nr() as f64 * self.dr())
    }

    /// Sample times `n·dt`, `n = 0..Nt`
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Centred sample positions along one spatial axis
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Temporal angular frequencies in FFT order
    pub fn temporal_freqs(&self) -> &[f64] {
        &self.temporal_freqs
    }

    /// Spatial wavenumbers in FFT order (shared by the x and y axes)
    pub fn spatial_freqs(&self) -> &[f64] {
        &self.spatial_freqs
    }

    /// Index of the origin along a spatial axis
    pub fn center_index(&self) -> usize {
        self.nr() / 2
    }

    /// Total number of (w, kx, ky) points
    pub fn grid_points(&self) -> usize {
        self.nt() * self.nr() * self.nr()
    }

    /// Scale turning an unnormalised 3-D inverse FFT into the continuous inverse transform
    pub fn inverse_scale(&self) -> f64 {
        let nr = self.nr() as f64;
        1.0 / (self.nt() as f64 * nr * nr * self.dt() * self.dr() * self.dr())
    }

    /// FFT-order index of the temporal frequency `w`, aliasing modulo `Nt`.
    ///
    /// # Errors
    /// `LgnError::OffGrid` if `w` is not an integer multiple of `dw`.
    pub fn temporal_index(&self, w: f64) -> Result<usize> {
        snap_to_axis(w, self.dw(), self.nt()).ok_or(LgnError::OffGrid {
            axis: "temporal frequency",
            value: w,
        })
    }

    /// FFT-order index of the spatial wavenumber `k`, aliasing modulo `Nr`.
    ///
    /// # Errors
    /// `LgnError::OffGrid` if `k` is not an integer multiple of `dk`.
    pub fn spatial_index(&self, k: f64) -> Result<usize> {
        snap_to_axis(k, self.dk(), self.nr()).ok_or(LgnError::OffGrid {
            axis: "spatial frequency",
            value: k,
        })
    }

    /// Fail with `DimensionMismatch` unless `other` describes this grid.
    pub fn ensure_same_grid(&self, other: GridSignature) -> Result<()> {
        if self.signature != other {
            return Err(LgnError::DimensionMismatch {
                expected: self.signature,
                actual: other,
            });
        }
        Ok(())
    }
}

/// `2π · numpy.fft.fftfreq(n, step)`
fn fft_angular_freqs(n: usize, step: f64) -> Vec<f64> {
    let scale = 2.0 * PI / (n as f64 * step);
    (0..n)
        .map(|i| {
            let m = if i < n.div_ceil(2) {
                i as i64
            } else {
                i as i64 - n as i64
            };
            m as f64 * scale
        })
        .collect()
}

fn snap_to_axis(value: f64, step: f64, n: usize) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let ratio = value / step;
    let m = ratio.round();
    if (ratio - m).abs() > GRID_SNAP_TOLERANCE * m.abs().max(1.0) {
        return None;
    }
    Some((m as i64).rem_euclid(n as i64) as usize)
}
