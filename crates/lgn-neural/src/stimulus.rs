// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Stimulus Generator
//!
//! Frequency-domain descriptions of the external input injected at ganglion cells.
//!
//! ## Patch Grating
//! ```text
//! Luminance:   c · cos(k_g·x - w_g t)   inside a disk of diameter D
//!
//! Spectrum:    c/2 · (2π/dw) · [ S(k - k_g) δ(w, -w_g) + S(k + k_g) δ(w, +w_g) ]
//!
//!   S(q) = 2πR · J1(R|q|) / |q|      0 < D < ∞   (R = D/2)
//!   S(q) = 1                         D = 0       (point stimulus)
//!   S(q) = (2π)²/dk² · δ(q, 0)       D = ∞       (full-field grating)
//! ```
//!
//! `δ(·,·)` are Kronecker deltas on the grid, which is why the temporal frequency
//! (and, for full-field gratings, the grating wavevector) must lie on the grid.

use core::f64::consts::PI;

use num_complex::Complex64;

use crate::error::{ensure_finite, LgnError, Result};
use crate::integrator::{GridSignature, Integrator};
use crate::special::disk_transform;

/// External input pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stimulus {
    /// Unit impulse in space and time (flat spectrum)
    Impulse,
    PatchGrating(PatchGrating),
}

impl Stimulus {
    /// Spatially masked drifting grating (see [`PatchGrating::new`])
    pub fn patch_grating(wavenumber: f64, angular_freq: f64, mask_size: f64) -> Result<Self> {
        PatchGrating::new(wavenumber, angular_freq, mask_size).map(Stimulus::PatchGrating)
    }

    /// Evaluate on `grid`.
    ///
    /// # Errors
    /// `LgnError::OffGrid` if a frequency the stimulus needs is not on the grid.
    pub fn spectrum(&self, grid: &Integrator) -> Result<StimulusSpectrum> {
        match self {
            Stimulus::Impulse => Ok(StimulusSpectrum::Flat),
            Stimulus::PatchGrating(grating) => grating.spectrum(grid),
        }
    }
}

impl From<PatchGrating> for Stimulus {
    fn from(grating: PatchGrating) -> Self {
        Stimulus::PatchGrating(grating)
    }
}

/// Drifting sinusoidal grating seen through a circular aperture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchGrating {
    wavenumber: f64,
    angular_freq: f64,
    mask_size: f64,
    orientation: f64,
    contrast: f64,
}

impl PatchGrating {
    /// `mask_size` is the aperture diameter: `0` gives a point stimulus and
    /// `f64::INFINITY` a full-field grating.
    pub fn new(wavenumber: f64, angular_freq: f64, mask_size: f64) -> Result<Self> {
        ensure_finite("patch_grating", "wavenumber", wavenumber)?;
        ensure_finite("patch_grating", "angular_freq", angular_freq)?;
        if mask_size.is_nan() || mask_size < 0.0 {
            return Err(LgnError::config(format!(
                "patch_grating: mask_size must be >= 0 (got {mask_size})"
            )));
        }
        Ok(Self {
            wavenumber,
            angular_freq,
            mask_size,
            orientation: 0.0,
            contrast: 1.0,
        })
    }

    /// Unmasked grating
    pub fn full_field(wavenumber: f64, angular_freq: f64) -> Result<Self> {
        Self::new(wavenumber, angular_freq, f64::INFINITY)
    }

    /// Flickering point of light at the origin
    pub fn point(angular_freq: f64) -> Result<Self> {
        Self::new(0.0, angular_freq, 0.0)
    }

    /// Grating orientation in radians (0 = wavevector along x)
    pub fn with_orientation(mut self, orientation: f64) -> Result<Self> {
        ensure_finite("patch_grating", "orientation", orientation)?;
        self.orientation = orientation;
        Ok(self)
    }

    pub fn with_contrast(mut self, contrast: f64) -> Result<Self> {
        ensure_finite("patch_grating", "contrast", contrast)?;
        self.contrast = contrast;
        Ok(self)
    }

    pub fn wavenumber(&self) -> f64 {
        self.wavenumber
    }

    pub fn angular_freq(&self) -> f64 {
        self.angular_freq
    }

    pub fn mask_size(&self) -> f64 {
        self.mask_size
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    pub fn contrast(&self) -> f64 {
        self.contrast
    }

    /// Grating wavevector `(kx_g, ky_g)`
    pub fn grating_vector(&self) -> (f64, f64) {
        (
            self.wavenumber * self.orientation.cos(),
            self.wavenumber * self.orientation.sin(),
        )
    }

    /// Evaluate on `grid`.
    pub fn spectrum(&self, grid: &Integrator) -> Result<StimulusSpectrum> {
        let minus = grid.temporal_index(-self.angular_freq)?;
        let plus = grid.temporal_index(self.angular_freq)?;
        let (gx, gy) = self.grating_vector();
        let scale = 0.5 * self.contrast * 2.0 * PI / grid.dw();

        let mut components = Vec::with_capacity(2);
        for (temporal_index, sign) in [(minus, -1.0), (plus, 1.0)] {
            // S(k - k_g) pairs with -w_g, S(k + k_g) with +w_g
            let spatial = self.aperture(grid, sign * gx, sign * gy, scale)?;
            push_component(&mut components, temporal_index, spatial);
        }

        Ok(StimulusSpectrum::Sparse {
            signature: grid.signature(),
            components,
        })
    }

    /// `scale · S(k + (ox, oy))` on the spatial grid, row-major.
    fn aperture(&self, grid: &Integrator, ox: f64, oy: f64, scale: f64) -> Result<Vec<Complex64>> {
        let k = grid.spatial_freqs();
        let nr = k.len();

        if self.mask_size.is_infinite() {
            let mut out = vec![Complex64::new(0.0, 0.0); nr * nr];
            let ix = grid.spatial_index(-ox)?;
            let iy = grid.spatial_index(-oy)?;
            let dk = grid.dk();
            out[ix * nr + iy] = Complex64::new(scale * (2.0 * PI).powi(2) / (dk * dk), 0.0);
            return Ok(out);
        }

        if self.mask_size == 0.0 {
            return Ok(vec![Complex64::new(scale, 0.0); nr * nr]);
        }

        let radius = 0.5 * self.mask_size;
        let mut out = Vec::with_capacity(nr * nr);
        for &kx in k {
            for &ky in k {
                let q = ((kx + ox).powi(2) + (ky + oy).powi(2)).sqrt();
                out.push(Complex64::new(scale * disk_transform(radius, q), 0.0));
            }
        }
        Ok(out)
    }
}

fn push_component(components: &mut Vec<TemporalComponent>, temporal_index: usize, spatial: Vec<Complex64>) {
    if let Some(existing) = components
        .iter_mut()
        .find(|c| c.temporal_index == temporal_index)
    {
        for (acc, v) in existing.spatial.iter_mut().zip(spatial) {
            *acc += v;
        }
    } else {
        components.push(TemporalComponent {
            temporal_index,
            spatial,
        });
    }
}

/// Spatial spectrum of a stimulus at one temporal frequency
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalComponent {
    /// FFT-order index on the temporal frequency axis
    pub temporal_index: usize,
    /// Row-major `[ix * Nr + iy]` values on the spatial frequency grid
    pub spatial: Vec<Complex64>,
}

/// A stimulus evaluated on a grid
#[derive(Debug, Clone, PartialEq)]
pub enum StimulusSpectrum {
    /// 1 at every grid point
    Flat,
    /// Non-zero only on the listed temporal frequencies
    Sparse {
        signature: GridSignature,
        components: Vec<TemporalComponent>,
    },
}

impl StimulusSpectrum {
    /// Value at grid point `(it, ix, iy)`
    pub fn value_at(&self, it: usize, ix: usize, iy: usize) -> Complex64 {
        match self {
            StimulusSpectrum::Flat => Complex64::new(1.0, 0.0),
            StimulusSpectrum::Sparse {
                signature,
                components,
            } => {
                let nr = 1usize << signature.nr;
                components
                    .iter()
                    .filter(|c| c.temporal_index == it)
                    .map(|c| c.spatial[ix * nr + iy])
                    .sum()
            }
        }
    }

    /// Fail unless this spectrum was built on `grid`.
    pub fn ensure_grid(&self, grid: &Integrator) -> Result<()> {
        match self {
            StimulusSpectrum::Flat => Ok(()),
            StimulusSpectrum::Sparse { signature, .. } => grid.ensure_same_grid(*signature),
        }
    }
}
