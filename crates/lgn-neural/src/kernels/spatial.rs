// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spatial Kernels
//!
//! Closed-form Fourier transforms of receptive-field profiles.
//!
//! ```text
//! delta(sx, sy):           exp(-i(kx·sx + ky·sy))
//! gaussian(A, a):          A · exp(-a² k² / 2)
//! dog(A, a, B, b):         gaussian(A, a) - gaussian(B, b)
//! ```
//!
//! `gaussian(A, a)` is the transform of `A / (2π a²) · exp(-r² / (2a²))`, so the
//! width `a` is the standard deviation of the spatial profile and `A` its volume.

use num_complex::Complex64;

use super::KernelShape;
use crate::error::{ensure_finite, ensure_non_negative, LgnError, Result};
use crate::integrator::Integrator;

/// Spatial filter, evaluated at wavevector `(kx, ky)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialKernel {
    Delta {
        shift_x: f64,
        shift_y: f64,
    },
    Gaussian {
        amplitude: f64,
        width: f64,
    },
    DifferenceOfGaussians {
        center_amplitude: f64,
        center_width: f64,
        surround_amplitude: f64,
        surround_width: f64,
    },
}

impl SpatialKernel {
    /// Identity pass-through
    pub fn delta() -> Self {
        SpatialKernel::Delta {
            shift_x: 0.0,
            shift_y: 0.0,
        }
    }

    /// Pure displacement of the input by `(shift_x, shift_y)`
    pub fn delta_shifted(shift_x: f64, shift_y: f64) -> Result<Self> {
        ensure_finite("delta", "shift_x", shift_x)?;
        ensure_finite("delta", "shift_y", shift_y)?;
        Ok(SpatialKernel::Delta { shift_x, shift_y })
    }

    pub fn gaussian(amplitude: f64, width: f64) -> Result<Self> {
        ensure_non_negative("gaussian", "amplitude", amplitude)?;
        ensure_non_negative("gaussian", "width", width)?;
        Ok(SpatialKernel::Gaussian { amplitude, width })
    }

    /// Excitatory centre `(A, a)` minus inhibitory surround `(B, b)`
    pub fn difference_of_gaussians(
        center_amplitude: f64,
        center_width: f64,
        surround_amplitude: f64,
        surround_width: f64,
    ) -> Result<Self> {
        const NAME: &str = "difference_of_gaussians";
        ensure_non_negative(NAME, "center_amplitude", center_amplitude)?;
        ensure_non_negative(NAME, "center_width", center_width)?;
        ensure_non_negative(NAME, "surround_amplitude", surround_amplitude)?;
        ensure_non_negative(NAME, "surround_width", surround_width)?;
        Ok(SpatialKernel::DifferenceOfGaussians {
            center_amplitude,
            center_width,
            surround_amplitude,
            surround_width,
        })
    }

    /// Build from a named shape and its positional parameters.
    ///
    /// - `Delta`: `[]` or `[shift_x, shift_y]`
    /// - `Gaussian`: `[A, a]`
    /// - `DifferenceOfGaussians`: `[A, a, B, b]`
    pub fn from_shape(shape: KernelShape, params: &[f64]) -> Result<Self> {
        match (shape, params) {
            (KernelShape::Delta, []) => Ok(Self::delta()),
            (KernelShape::Delta, &[sx, sy]) => Self::delta_shifted(sx, sy),
            (KernelShape::Gaussian, &[a, w]) => Self::gaussian(a, w),
            (KernelShape::DifferenceOfGaussians, &[a, w, b, v]) => {
                Self::difference_of_gaussians(a, w, b, v)
            }
            (KernelShape::ExponentialDecay | KernelShape::Biphasic, _) => Err(
                LgnError::config(format!("{shape} is a temporal shape, not a spatial one")),
            ),
            _ => Err(LgnError::config(format!(
                "{shape}: unexpected parameter count {}",
                params.len()
            ))),
        }
    }

    pub fn shape(&self) -> KernelShape {
        match self {
            SpatialKernel::Delta { .. } => KernelShape::Delta,
            SpatialKernel::Gaussian { .. } => KernelShape::Gaussian,
            SpatialKernel::DifferenceOfGaussians { .. } => KernelShape::DifferenceOfGaussians,
        }
    }

    /// Complex gain at wavevector `(kx, ky)`
    #[inline]
    pub fn gain(&self, kx: f64, ky: f64) -> Complex64 {
        match *self {
            SpatialKernel::Delta { shift_x, shift_y } => {
                if shift_x == 0.0 && shift_y == 0.0 {
                    Complex64::new(1.0, 0.0)
                } else {
                    Complex64::from_polar(1.0, -(kx * shift_x + ky * shift_y))
                }
            }
            SpatialKernel::Gaussian { amplitude, width } => {
                Complex64::new(gauss(amplitude, width, kx * kx + ky * ky), 0.0)
            }
            SpatialKernel::DifferenceOfGaussians {
                center_amplitude,
                center_width,
                surround_amplitude,
                surround_width,
            } => {
                let k2 = kx * kx + ky * ky;
                Complex64::new(
                    gauss(center_amplitude, center_width, k2)
                        - gauss(surround_amplitude, surround_width, k2),
                    0.0,
                )
            }
        }
    }

    /// Gain sampled on the `(kx, ky)` grid, row-major `[ix * Nr + iy]`.
    pub fn sample(&self, grid: &Integrator) -> Vec<Complex64> {
        let k = grid.spatial_freqs();
        let mut out = Vec::with_capacity(k.len() * k.len());
        for &kx in k {
            for &ky in k {
                out.push(self.gain(kx, ky));
            }
        }
        out
    }
}

impl Default for SpatialKernel {
    fn default() -> Self {
        Self::delta()
    }
}

#[inline]
fn gauss(amplitude: f64, width: f64, k2: f64) -> f64 {
    amplitude * (-0.5 * width * width * k2).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_values() {
        assert_eq!(SpatialKernel::delta().gain(0.0, 0.0), Complex64::new(1.0, 0.0));
        let g = SpatialKernel::gaussian(2.5, 0.7).unwrap();
        assert!((g.gain(0.0, 0.0).re - 2.5).abs() < 1e-15);
        let dog = SpatialKernel::difference_of_gaussians(1.0, 0.62, 0.85, 1.26).unwrap();
        assert!((dog.gain(0.0, 0.0).re - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_delta_is_identity_everywhere() {
        let d = SpatialKernel::delta();
        for (kx, ky) in [(3.0, -1.0), (100.0, 42.0), (-7.5, 0.0)] {
            assert_eq!(d.gain(kx, ky), Complex64::new(1.0, 0.0));
        }
    }

    #[test]
    fn test_shifted_delta_is_pure_phase() {
        let d = SpatialKernel::delta_shifted(0.5, -0.25).unwrap();
        let g = d.gain(2.0, 4.0);
        assert!((g.norm() - 1.0).abs() < 1e-12);
        // -(2·0.5 + 4·(-0.25)) = 0
        assert!((g.arg()).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_closed_form() {
        let g = SpatialKernel::gaussian(1.0, 0.5).unwrap();
        let k = 3.0_f64;
        let expected = (-0.5 * 0.25 * k * k).exp();
        assert!((g.gain(k, 0.0).re - expected).abs() < 1e-15);
        // Radial: rotating the wavevector does not change the gain
        let rotated = g.gain(k / 2f64.sqrt(), k / 2f64.sqrt());
        assert!((rotated.re - expected).abs() < 1e-12);
        assert_eq!(rotated.im, 0.0);
    }

    #[test]
    fn test_zero_width_is_constant() {
        let g = SpatialKernel::gaussian(1.7, 0.0).unwrap();
        for k in [0.0, 10.0, 1e4] {
            assert_eq!(g.gain(k, k).re, 1.7);
        }
    }

    #[test]
    fn test_negative_parameters_rejected() {
        assert!(SpatialKernel::gaussian(-1.0, 0.5).is_err());
        assert!(SpatialKernel::gaussian(1.0, -0.5).is_err());
        assert!(SpatialKernel::difference_of_gaussians(1.0, 0.5, 0.8, -1.0).is_err());
        assert!(SpatialKernel::gaussian(f64::INFINITY, 0.5).is_err());
        assert!(SpatialKernel::delta_shifted(f64::NAN, 0.0).is_err());
        assert!(SpatialKernel::delta_shifted(-2.0, 0.0).is_ok());
    }

    #[test]
    fn test_from_shape() {
        let g = SpatialKernel::from_shape(KernelShape::Gaussian, &[1.0, 0.1]).unwrap();
        assert_eq!(g, SpatialKernel::gaussian(1.0, 0.1).unwrap());
        assert_eq!(
            SpatialKernel::from_shape(KernelShape::Delta, &[]).unwrap(),
            SpatialKernel::delta()
        );
        assert!(SpatialKernel::from_shape(KernelShape::Gaussian, &[1.0]).is_err());
        assert!(SpatialKernel::from_shape(KernelShape::Biphasic, &[1.0, 0.1, 0.0]).is_err());
    }

    #[test]
    fn test_sample_layout() {
        let grid = Integrator::new(0, 2, 1.0, 0.5).unwrap();
        let g = SpatialKernel::gaussian(1.0, 0.3).unwrap();
        let sampled = g.sample(&grid);
        let k = grid.spatial_freqs();
        assert_eq!(sampled.len(), 16);
        let (ix, iy) = (1, 3);
        assert_eq!(sampled[ix * 4 + iy], g.gain(k[ix], k[iy]));
    }
}
