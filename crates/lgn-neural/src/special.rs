// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Special functions used by the aperture transforms.
//!
//! Bessel J1 uses the classic rational approximation below |x| = 8 and the
//! Hankel asymptotic form above it (absolute error around 1e-8).

use core::f64::consts::PI;

/// Bessel function of the first kind, order one.
pub fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let num = x
            * (72_362_614_232.0
                + y * (-7_895_059_235.0
                    + y * (242_396_853.1
                        + y * (-2_972_611.439 + y * (15_704.482_60 + y * (-30.160_366_06))))));
        let den = 144_725_228_442.0
            + y * (2_300_535_178.0
                + y * (18_583_304.74 + y * (99_447.433_94 + y * (376.999_139_7 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 0.75 * PI;
        let p = 1.0
            + y * (0.183_105e-2
                + y * (-0.351_639_649_6e-4 + y * (0.245_752_017_4e-5 + y * (-0.240_337_019e-6))));
        let q = 0.046_874_999_95
            + y * (-0.200_269_087_3e-3
                + y * (0.844_919_909_6e-5 + y * (-0.882_289_87e-6 + y * 0.105_787_412e-6)));
        let ans = (2.0 / (PI * ax)).sqrt() * (xx.cos() * p - z * xx.sin() * q);
        if x < 0.0 {
            -ans
        } else {
            ans
        }
    }
}

/// Fourier transform of a unit-height disk of radius `radius` at wavenumber `q`.
///
/// `2π·R·J1(R·q)/q`, with the limit `π·R²` at `q = 0`.
pub fn disk_transform(radius: f64, q: f64) -> f64 {
    let arg = radius * q;
    if arg.abs() < 1e-8 {
        return PI * radius * radius;
    }
    2.0 * PI * radius * bessel_j1(arg) / q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_j1_reference_values() {
        // Abramowitz & Stegun table 9.1
        let cases = [
            (0.0, 0.0),
            (1.0, 0.440_050_585_7),
            (2.0, 0.576_724_807_8),
            (5.0, -0.327_579_137_6),
            (10.0, 0.043_472_746_2),
        ];
        for (x, expected) in cases {
            assert!(
                (bessel_j1(x) - expected).abs() < 1e-6,
                "J1({x}) = {} expected {expected}",
                bessel_j1(x)
            );
        }
    }

    #[test]
    fn test_j1_is_odd() {
        for x in [0.3, 4.2, 9.7, 25.0] {
            assert!((bessel_j1(-x) + bessel_j1(x)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_disk_transform_limit() {
        let r = 1.5;
        assert!((disk_transform(r, 0.0) - PI * r * r).abs() < 1e-12);
        assert!((disk_transform(r, 1e-6) - PI * r * r).abs() < 1e-6);
        assert_eq!(disk_transform(0.0, 3.0), 0.0);
    }
}
