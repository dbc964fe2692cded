// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Inverse transforms from the frequency grid back to space-time.
//!
//! ```text
//! f[n, x, y] = shift_xy( IFFT3(F) ) / (Nt · Nr² · dt · dr²)
//! ```
//!
//! `rustfft` inverse transforms are unnormalised; the grid scale is applied
//! once at the end. Spatial axes are shifted so the origin sits at `Nr/2`.

use lgn_neural::Integrator;
use ndarray::{Array1, Array3, ArrayViewMut1, Axis, Zip};
use num_complex::Complex64;
use rustfft::FftPlanner;
use tracing::trace;

/// Real part of a transformed array and the largest discarded imaginary part
#[derive(Debug, Clone)]
pub struct RealField<D> {
    pub values: D,
    pub max_imaginary: f64,
}

/// Unnormalised inverse FFT along every axis of `data`, in place.
pub fn inverse_fft_3d(data: &mut Array3<Complex64>, parallel: bool) {
    let mut planner = FftPlanner::<f64>::new();
    for axis in 0..3 {
        let len = data.len_of(Axis(axis));
        if len < 2 {
            continue;
        }
        let fft = planner.plan_fft_inverse(len);
        let process = |mut lane: ArrayViewMut1<Complex64>| {
            let mut buffer = lane.to_vec();
            fft.process(&mut buffer);
            for (dst, src) in lane.iter_mut().zip(buffer) {
                *dst = src;
            }
        };
        let lanes = Zip::from(data.lanes_mut(Axis(axis)));
        if parallel {
            lanes.par_for_each(process);
        } else {
            lanes.for_each(process);
        }
        trace!(axis, len, "Inverse FFT pass");
    }
}

/// Unnormalised inverse FFT of a single sequence, in place.
pub fn inverse_fft_1d(data: &mut [Complex64]) {
    if data.len() < 2 {
        return;
    }
    FftPlanner::<f64>::new()
        .plan_fft_inverse(data.len())
        .process(data);
}

/// Full space-time field from a spectrum on `grid`'s `(w, kx, ky)` axes.
pub fn spectrum_to_field(
    grid: &Integrator,
    mut spectrum: Array3<Complex64>,
    parallel: bool,
) -> RealField<Array3<f64>> {
    inverse_fft_3d(&mut spectrum, parallel);

    let scale = grid.inverse_scale();
    let nr = grid.nr();
    let shift = nr / 2;
    let mut max_imaginary = 0.0_f64;
    let mut values = Array3::<f64>::zeros(spectrum.raw_dim());
    for ((it, ix, iy), v) in spectrum.indexed_iter() {
        let v = *v * scale;
        max_imaginary = max_imaginary.max(v.im.abs());
        values[[it, (ix + shift) % nr, (iy + shift) % nr]] = v.re;
    }

    RealField {
        values,
        max_imaginary,
    }
}

/// Time course at the spatial origin from a spatially summed spectrum.
///
/// `spatial_sum[m] = Σ_k F(w_m, k)`; the spatial inverse at `x = 0` is that sum
/// divided by `Nr²·dr²`, followed by a temporal inverse.
pub fn center_time_course(grid: &Integrator, mut spatial_sum: Vec<Complex64>) -> RealField<Array1<f64>> {
    inverse_fft_1d(&mut spatial_sum);
    let scale = grid.inverse_scale();

    let mut max_imaginary = 0.0_f64;
    let values = spatial_sum
        .into_iter()
        .map(|v| {
            let v = v * scale;
            max_imaginary = max_imaginary.max(v.im.abs());
            v.re
        })
        .collect::<Array1<f64>>();

    RealField {
        values,
        max_imaginary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_inverse_of_constant_is_impulse() {
        let mut data = Array3::from_elem((4, 2, 2), Complex64::new(1.0, 0.0));
        inverse_fft_3d(&mut data, false);
        assert!((data[[0, 0, 0]] - Complex64::new(16.0, 0.0)).norm() < 1e-12);
        let rest: f64 = data.iter().skip(1).map(|v| v.norm()).sum();
        assert!(rest < 1e-12);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let data = Array3::from_shape_fn((8, 4, 4), |(t, x, y)| {
            Complex64::new((t * 3 + x) as f64, (y as f64 - x as f64) * 0.5)
        });
        let mut serial = data.clone();
        let mut parallel = data;
        inverse_fft_3d(&mut serial, false);
        inverse_fft_3d(&mut parallel, true);
        for (a, b) in serial.iter().zip(parallel.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn test_inverse_1d_single_mode() {
        // e^{+i 2π n / N} for the m = 1 bin
        let n = 8;
        let mut data = vec![Complex64::new(0.0, 0.0); n];
        data[1] = Complex64::new(1.0, 0.0);
        inverse_fft_1d(&mut data);
        for (k, v) in data.iter().enumerate() {
            let expected = Complex64::from_polar(1.0, 2.0 * PI * k as f64 / n as f64);
            assert!((v - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_field_is_centred() {
        // Flat spectrum -> scaled impulse at the spatial origin, t = 0
        let grid = Integrator::new(2, 2, 0.5, 0.25).unwrap();
        let spectrum = Array3::from_elem((4, 4, 4), Complex64::new(1.0, 0.0));
        let field = spectrum_to_field(&grid, spectrum, false);
        let c = grid.center_index();
        let expected = 1.0 / (grid.dt() * grid.dr() * grid.dr());
        assert!((field.values[[0, c, c]] - expected).abs() < 1e-9);
        assert!(field.values[[0, 0, 0]].abs() < 1e-9);
        assert!(field.max_imaginary < 1e-9);
    }

    #[test]
    fn test_center_time_course_matches_field() {
        let grid = Integrator::new(3, 2, 1.0, 0.5).unwrap();
        let spectrum = Array3::from_shape_fn((8, 4, 4), |(t, x, y)| {
            let w = grid.temporal_freqs()[t];
            let k2 = grid.spatial_freqs()[x].powi(2) + grid.spatial_freqs()[y].powi(2);
            Complex64::new((-k2).exp(), 0.0) / Complex64::new(1.0, w)
        });
        let sums: Vec<Complex64> = spectrum
            .outer_iter()
            .map(|plane| plane.iter().sum())
            .collect();
        let course = center_time_course(&grid, sums);
        let field = spectrum_to_field(&grid, spectrum, false);
        let c = grid.center_index();
        for n in 0..8 {
            assert!((course.values[n] - field.values[[n, c, c]]).abs() < 1e-9);
        }
    }
}
