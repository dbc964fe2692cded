// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Transfer-Function Solver
//!
//! At every grid point `(w, kx, ky)` the node responses satisfy
//!
//! ```text
//! R = M·R + s          M[target][source] = Σ weight · Ks(kx, ky) · Kt(w)
//!                      s[ganglion]       = Ws(kx, ky) · Wt(w)
//!
//! (I - M)·R = s        solved by Gaussian elimination with partial pivoting
//! ```
//!
//! `R` is the response of every node to a unit stimulus at the ganglion input
//! ports, so a stimulus spectrum only has to be multiplied in afterwards.
//! Feedback loops are resolved exactly; for acyclic graphs `I - M` is
//! unit-triangular and the solve reduces to the kernel cascade.
//!
//! Grid points are independent and are solved as a data-parallel map over
//! `(w, kx)` rows, each worker reusing one set of scratch buffers.
//!
//! ## Instability
//! `|det(I - M)|` below `singularity_tolerance` marks a point as
//! near-singular. Independently, a point whose loop gain (spectral radius of
//! `M`) is at least one is supercritical, even when `|det|` stays well above
//! the tolerance on every sampled frequency. Results
//! are never clamped: large outputs are returned as is and reported through
//! [`SolveDiagnostics::warning`].

use core::fmt;
use std::time::Instant;

use lgn_config::SolverConfig;
use lgn_neural::{GridSignature, Integrator};
use ndarray::{Array3, Array4, ArrayView3, ArrayViewMut1, ArrayViewMut2, Axis};
use num_complex::Complex64;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::network::{Edge, Node};

/// One grid point, by index and by frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub temporal_index: usize,
    pub kx_index: usize,
    pub ky_index: usize,
    pub w: f64,
    pub kx: f64,
    pub ky: f64,
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(w={:.4}, kx={:.4}, ky={:.4})", self.w, self.kx, self.ky)
    }
}

/// Non-fatal report that the feedback solve is unreliable somewhere on the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericalInstabilityWarning {
    pub near_singular_points: usize,
    /// Points with an exactly zero pivot (non-finite output)
    pub singular_points: usize,
    /// Points whose loop gain (spectral radius of `M`) is at least one
    pub supercritical_points: usize,
    pub min_abs_determinant: f64,
    pub max_loop_gain: f64,
    pub tolerance: f64,
    pub worst_point: Option<GridPoint>,
}

impl fmt::Display for NumericalInstabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "feedback matrix near-singular at {} grid point(s) ({} singular), loop gain >= 1 at {}; \
             min |det| = {:.3e} (tolerance {:.1e}), max loop gain = {:.4}",
            self.near_singular_points,
            self.singular_points,
            self.supercritical_points,
            self.min_abs_determinant,
            self.tolerance,
            self.max_loop_gain
        )?;
        if let Some(point) = self.worst_point {
            write!(f, " at {point}")?;
        }
        Ok(())
    }
}

/// Per-solve conditioning statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveDiagnostics {
    pub grid_points: usize,
    pub near_singular_points: usize,
    pub singular_points: usize,
    pub supercritical_points: usize,
    pub min_abs_determinant: f64,
    /// Largest loop-gain estimate on the grid. An upper bound on the spectral
    /// radius of `M`; below one it may overshoot, at or above one it is tight.
    pub max_loop_gain: f64,
    pub tolerance: f64,
    /// Smallest `|det|` point when near-singular, else the largest loop gain
    pub worst_point: Option<GridPoint>,
}

impl SolveDiagnostics {
    /// `Some` when a point fell below the tolerance or has loop gain `>= 1`
    pub fn warning(&self) -> Option<NumericalInstabilityWarning> {
        (!self.is_stable()).then_some(NumericalInstabilityWarning {
            near_singular_points: self.near_singular_points,
            singular_points: self.singular_points,
            supercritical_points: self.supercritical_points,
            min_abs_determinant: self.min_abs_determinant,
            max_loop_gain: self.max_loop_gain,
            tolerance: self.tolerance,
            worst_point: self.worst_point,
        })
    }

    pub fn is_stable(&self) -> bool {
        self.near_singular_points == 0 && self.supercritical_points == 0
    }
}

/// Solved node responses to a unit stimulus, on every grid point
#[derive(Debug, Clone)]
pub struct TransferFunctions {
    signature: GridSignature,
    /// `(Nt, Nr, Nr, nodes)`, frequency axes in FFT order
    values: Array4<Complex64>,
    diagnostics: SolveDiagnostics,
}

impl TransferFunctions {
    pub fn signature(&self) -> GridSignature {
        self.signature
    }

    pub fn node_count(&self) -> usize {
        self.values.len_of(Axis(3))
    }

    pub fn diagnostics(&self) -> &SolveDiagnostics {
        &self.diagnostics
    }

    /// Transfer function of node `index` over `(w, kx, ky)`
    pub fn node(&self, index: usize) -> ArrayView3<'_, Complex64> {
        self.values.index_axis(Axis(3), index)
    }

    pub fn values(&self) -> &Array4<Complex64> {
        &self.values
    }
}

/// Repeated squarings used by [`loop_gain`]
const LOOP_GAIN_SQUARINGS: usize = 24;

/// Edge gains sampled once per axis value
struct SampledEdge {
    source: usize,
    target: usize,
    weight: f64,
    spatial: Vec<Complex64>,
    temporal: Vec<Complex64>,
}

struct SampledInput {
    node: usize,
    spatial: Vec<Complex64>,
    temporal: Vec<Complex64>,
}

/// The sampled network, ready to be assembled at any grid point
struct SampledSystem {
    nodes: usize,
    nr: usize,
    edges: Vec<SampledEdge>,
    inputs: Vec<SampledInput>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PointCheck {
    abs_determinant: f64,
    loop_gain: f64,
}

/// Buffers reused across the points of a row, one set per worker
struct Scratch {
    feedback: Vec<Complex64>,
    system: Vec<Complex64>,
    rhs: Vec<Complex64>,
    power: Vec<Complex64>,
    product: Vec<Complex64>,
}

impl Scratch {
    fn new(n: usize) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self {
            feedback: vec![zero; n * n],
            system: vec![zero; n * n],
            rhs: vec![zero; n],
            power: vec![zero; n * n],
            product: vec![zero; n * n],
        }
    }
}

impl SampledSystem {
    /// Fill `M`, `I - M` and `s` for grid point `(it, k)`.
    fn assemble(&self, scratch: &mut Scratch, it: usize, k: usize) {
        let n = self.nodes;
        let zero = Complex64::new(0.0, 0.0);

        scratch.feedback.fill(zero);
        for edge in &self.edges {
            scratch.feedback[edge.target * n + edge.source] +=
                edge.weight * edge.spatial[k] * edge.temporal[it];
        }
        for (i, (a, m)) in scratch.system.iter_mut().zip(&scratch.feedback).enumerate() {
            *a = if i % (n + 1) == 0 {
                Complex64::new(1.0, 0.0) - *m
            } else {
                -*m
            };
        }

        scratch.rhs.fill(zero);
        for input in &self.inputs {
            scratch.rhs[input.node] += input.spatial[k] * input.temporal[it];
        }
    }

    /// Solve every `ky` point of the `(it, ix)` row.
    fn solve_row(
        &self,
        scratch: &mut Scratch,
        it: usize,
        ix: usize,
        mut row: ArrayViewMut2<'_, Complex64>,
        mut checks: ArrayViewMut1<'_, PointCheck>,
    ) {
        let n = self.nodes;
        for iy in 0..self.nr {
            self.assemble(scratch, it, ix * self.nr + iy);
            let det = solve_in_place(&mut scratch.system, &mut scratch.rhs, n);
            for (dst, src) in row.row_mut(iy).iter_mut().zip(&scratch.rhs) {
                *dst = *src;
            }
            checks[iy] = PointCheck {
                abs_determinant: det.norm(),
                loop_gain: loop_gain(&scratch.feedback, n, &mut scratch.power, &mut scratch.product),
            };
        }
    }
}

/// Solve `(I - M)·R = s` on every point of `grid`.
pub fn solve_transfer_functions(
    grid: &Integrator,
    nodes: &[Node],
    edges: &[Edge],
    config: &SolverConfig,
) -> TransferFunctions {
    let started = Instant::now();
    let n = nodes.len();
    let (nt, nr) = (grid.nt(), grid.nr());

    let sample_edge = |edge: &Edge| SampledEdge {
        source: edge.source.index(),
        target: edge.target.index(),
        weight: edge.weight,
        spatial: edge.kernel.spatial.sample(grid),
        temporal: edge.kernel.temporal.sample(grid),
    };
    let sampled_edges: Vec<SampledEdge> = if config.parallel {
        edges.par_iter().map(sample_edge).collect()
    } else {
        edges.iter().map(sample_edge).collect()
    };
    let inputs: Vec<SampledInput> = nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            node.input_kernel().map(|kernel| SampledInput {
                node: index,
                spatial: kernel.spatial.sample(grid),
                temporal: kernel.temporal.sample(grid),
            })
        })
        .collect();
    let system = SampledSystem {
        nodes: n,
        nr,
        edges: sampled_edges,
        inputs,
    };

    let mut values = Array4::<Complex64>::zeros((nt, nr, nr, n));
    let mut checks = Array3::<PointCheck>::default((nt, nr, nr));

    if config.parallel {
        values
            .outer_iter_mut()
            .into_par_iter()
            .zip(checks.outer_iter_mut())
            .enumerate()
            .for_each(|(it, (mut plane, mut plane_checks))| {
                plane
                    .outer_iter_mut()
                    .into_par_iter()
                    .zip(plane_checks.outer_iter_mut())
                    .enumerate()
                    .for_each_init(
                        || Scratch::new(n),
                        |scratch, (ix, (row, row_checks))| {
                            system.solve_row(scratch, it, ix, row, row_checks)
                        },
                    );
            });
    } else {
        let mut scratch = Scratch::new(n);
        for (it, (mut plane, mut plane_checks)) in values
            .outer_iter_mut()
            .zip(checks.outer_iter_mut())
            .enumerate()
        {
            for (ix, (row, row_checks)) in plane
                .outer_iter_mut()
                .zip(plane_checks.outer_iter_mut())
                .enumerate()
            {
                system.solve_row(&mut scratch, it, ix, row, row_checks);
            }
        }
    }

    let diagnostics = summarize(grid, &checks, config.singularity_tolerance);
    debug!(
        grid_points = diagnostics.grid_points,
        nodes = n,
        edges = edges.len(),
        parallel = config.parallel,
        elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
        "Solved transfer functions"
    );
    if let Some(warning) = diagnostics.warning() {
        warn!(%warning, "Numerical instability in feedback solve");
    }

    TransferFunctions {
        signature: grid.signature(),
        values,
        diagnostics,
    }
}

fn summarize(grid: &Integrator, checks: &Array3<PointCheck>, tolerance: f64) -> SolveDiagnostics {
    let mut near_singular_points = 0;
    let mut singular_points = 0;
    let mut supercritical_points = 0;
    let mut min_abs_determinant = f64::INFINITY;
    let mut max_loop_gain = 0.0_f64;
    let mut smallest_det = None;
    let mut largest_gain = None;

    for (index, check) in checks.indexed_iter() {
        let det = check.abs_determinant;
        if det < tolerance {
            near_singular_points += 1;
        }
        if det == 0.0 {
            singular_points += 1;
        }
        if det < min_abs_determinant {
            min_abs_determinant = det;
            smallest_det = Some(index);
        }
        if check.loop_gain >= 1.0 {
            supercritical_points += 1;
        }
        if check.loop_gain > max_loop_gain {
            max_loop_gain = check.loop_gain;
            largest_gain = Some(index);
        }
    }

    let worst = if near_singular_points > 0 {
        smallest_det
    } else if supercritical_points > 0 {
        largest_gain
    } else {
        None
    };
    let worst_point = worst.map(|(it, ix, iy)| GridPoint {
        temporal_index: it,
        kx_index: ix,
        ky_index: iy,
        w: grid.temporal_freqs()[it],
        kx: grid.spatial_freqs()[ix],
        ky: grid.spatial_freqs()[iy],
    });

    SolveDiagnostics {
        grid_points: checks.len(),
        near_singular_points,
        singular_points,
        supercritical_points,
        min_abs_determinant,
        max_loop_gain,
        tolerance,
        worst_point,
    }
}

fn frobenius(m: &[Complex64]) -> f64 {
    m.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
}

/// Upper estimate of the spectral radius of the row-major `n×n` matrix `m`.
///
/// Uses `ρ(M) = lim ‖M^p‖^(1/p)` with `p = 2^j`, squaring a normalised copy
/// so large gains cannot overflow. Every iterate bounds `ρ` from above, so the
/// loop stops as soon as the bound drops below one. `power` and `product` are
/// `n×n` work buffers.
fn loop_gain(m: &[Complex64], n: usize, power: &mut [Complex64], product: &mut [Complex64]) -> f64 {
    let norm = frobenius(m);
    if norm < 1.0 {
        return norm;
    }
    for (dst, src) in power.iter_mut().zip(m) {
        *dst = *src / norm;
    }

    // ln‖M^p‖ / p
    let mut log_gain = norm.ln();
    let mut inv_power = 1.0;
    for _ in 0..LOOP_GAIN_SQUARINGS {
        for row in 0..n {
            for col in 0..n {
                product[row * n + col] = (0..n).map(|k| power[row * n + k] * power[k * n + col]).sum();
            }
        }
        let scale = frobenius(product);
        if scale == 0.0 {
            return 0.0;
        }
        inv_power *= 0.5;
        log_gain += scale.ln() * inv_power;
        if log_gain < 0.0 {
            break;
        }
        for (dst, src) in power.iter_mut().zip(product.iter()) {
            *dst = *src / scale;
        }
    }
    log_gain.exp()
}

/// Solve the row-major `n×n` system `a·x = b` in place (`x` overwrites `b`).
///
/// Returns the determinant. An exactly zero pivot is not clamped; the
/// division produces non-finite values.
fn solve_in_place(a: &mut [Complex64], b: &mut [Complex64], n: usize) -> Complex64 {
    let mut det = Complex64::new(1.0, 0.0);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i * n + col].norm_sqr().total_cmp(&a[j * n + col].norm_sqr()))
            .unwrap_or(col);
        if pivot_row != col {
            for k in 0..n {
                a.swap(col * n + k, pivot_row * n + k);
            }
            b.swap(col, pivot_row);
            det = -det;
        }

        let pivot = a[col * n + col];
        det *= pivot;

        for row in col + 1..n {
            let factor = a[row * n + col] / pivot;
            if factor == Complex64::new(0.0, 0.0) {
                continue;
            }
            for k in col..n {
                let upper = a[col * n + k];
                a[row * n + k] -= factor * upper;
            }
            let upper = b[col];
            b[row] -= factor * upper;
        }
    }

    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in row + 1..n {
            acc -= a[row * n + k] * b[k];
        }
        b[row] = acc / a[row * n + row];
    }

    det
}
