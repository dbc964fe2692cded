// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Kernel Library
//!
//! Fourier-domain linear filters. Every connection (and every ganglion cell's
//! intrinsic receptive field) carries one spatial and one temporal kernel; the
//! joint gain at a grid point is their product (separability).
//!
//! ## Adding a New Shape
//!
//! 1. Add a variant to `SpatialKernel` or `TemporalKernel`
//! 2. Add its closed-form gain and a validating constructor
//! 3. Register it in `KernelShape` and `from_shape`
//! 4. Add tests (DC value, limit behaviour, parameter validation)

pub mod spatial;
pub mod temporal;

use core::fmt;

use num_complex::Complex64;

pub use spatial::SpatialKernel;
pub use temporal::TemporalKernel;

/// Named kernel shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelShape {
    Delta,
    Gaussian,
    DifferenceOfGaussians,
    ExponentialDecay,
    Biphasic,
}

impl fmt::Display for KernelShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelShape::Delta => "delta",
            KernelShape::Gaussian => "gaussian",
            KernelShape::DifferenceOfGaussians => "difference-of-gaussians",
            KernelShape::ExponentialDecay => "exponential-decay",
            KernelShape::Biphasic => "biphasic",
        };
        f.write_str(name)
    }
}

/// A spatial kernel and a temporal kernel applied together
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KernelPair {
    pub spatial: SpatialKernel,
    pub temporal: TemporalKernel,
}

impl KernelPair {
    pub fn new(spatial: SpatialKernel, temporal: TemporalKernel) -> Self {
        Self { spatial, temporal }
    }

    /// `delta × delta`: passes its input through unchanged
    pub fn identity() -> Self {
        Self::default()
    }

    /// Joint gain `spatial(kx, ky) · temporal(w)`
    #[inline]
    pub fn gain(&self, kx: f64, ky: f64, w: f64) -> Complex64 {
        self.spatial.gain(kx, ky) * self.temporal.gain(w)
    }
}

impl From<(SpatialKernel, TemporalKernel)> for KernelPair {
    fn from((spatial, temporal): (SpatialKernel, TemporalKernel)) -> Self {
        Self::new(spatial, temporal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pair_is_separable_product() {
        let pair = KernelPair::new(
            SpatialKernel::difference_of_gaussians(1.0, 0.62, 0.85, 1.26).unwrap(),
            TemporalKernel::biphasic(42.5, 0.38, 0.0).unwrap(),
        );
        let (kx, ky, w) = (1.3, -0.4, 0.02);
        let expected = pair.spatial.gain(kx, ky) * pair.temporal.gain(w);
        assert_eq!(pair.gain(kx, ky, w), expected);
    }

    #[test]
    fn test_identity_pair() {
        let id = KernelPair::identity();
        assert_eq!(id.gain(5.0, 2.0, 9.0), Complex64::new(1.0, 0.0));
        assert_eq!(id.spatial.shape(), KernelShape::Delta);
        assert_eq!(id.temporal.shape(), KernelShape::Delta);
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(KernelShape::DifferenceOfGaussians.to_string(), "difference-of-gaussians");
        assert_eq!(KernelShape::ExponentialDecay.to_string(), "exponential-decay");
    }

    proptest! {
        #[test]
        fn prop_gaussian_is_bounded_by_amplitude(
            amplitude in 0.0f64..10.0,
            width in 0.0f64..5.0,
            kx in -50.0f64..50.0,
            ky in -50.0f64..50.0,
        ) {
            let g = SpatialKernel::gaussian(amplitude, width).unwrap().gain(kx, ky);
            prop_assert!(g.re <= amplitude + 1e-12);
            prop_assert!(g.re >= 0.0);
            prop_assert_eq!(g.im, 0.0);
        }

        #[test]
        fn prop_exponential_decay_never_amplifies(
            tau in 0.0f64..100.0,
            delay in 0.0f64..50.0,
            w in -10.0f64..10.0,
        ) {
            let g = TemporalKernel::exponential_decay(tau, delay).unwrap().gain(w);
            prop_assert!(g.norm() <= 1.0 + 1e-12);
        }

        #[test]
        fn prop_real_kernels_are_hermitian(
            t in 1.0f64..80.0,
            zeta in 0.0f64..1.0,
            w in 0.001f64..5.0,
        ) {
            // a real impulse response has G(-w) = conj(G(w))
            let b = TemporalKernel::biphasic(t, zeta, 0.0).unwrap();
            prop_assert!((b.gain(-w) - b.gain(w).conj()).norm() < 1e-9);
        }
    }
}
