// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Response Evaluator
//!
//! Turns solved transfer functions into space-time arrays.
//!
//! ```text
//! compute_irf(node):              irf(t, x, y) = IFFT3[ H_node ]
//! compute_response(node):         r(t, 0)      = IFFT_t[ Σ_k H_node · S ] / (Nr² dr²)
//! compute_response_field(node):   r(t, x, y)   = IFFT3[ H_node · S ]
//! ```
//!
//! The imaginary residue of every inverse transform is reported alongside the
//! real result; for a kernel set with real impulse responses it is small.

use lgn_neural::{GridSignature, LgnError, Result, StimulusSpectrum};
use ndarray::{s, Array1, Array3, ArrayView1};
use num_complex::Complex64;
use tracing::{debug, warn};

use crate::fft::{center_time_course, spectrum_to_field};
use crate::network::{Network, NodeId, NodeKind};
use crate::solver::{solve_transfer_functions, NumericalInstabilityWarning, SolveDiagnostics, TransferFunctions};

/// Impulse response of one node over the whole grid
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    node: NodeId,
    signature: GridSignature,
    irf: Array3<f64>,
    max_imaginary: f64,
    diagnostics: SolveDiagnostics,
}

impl ImpulseResponse {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn signature(&self) -> GridSignature {
        self.signature
    }

    /// `(t, x, y)` with the spatial origin at index `Nr/2`
    pub fn irf(&self) -> &Array3<f64> {
        &self.irf
    }

    /// Time course at the spatial origin
    pub fn center_irf(&self) -> ArrayView1<'_, f64> {
        let c = (1usize << self.signature.nr) / 2;
        self.irf.slice(s![.., c, c])
    }

    /// Largest discarded imaginary part
    pub fn max_imaginary(&self) -> f64 {
        self.max_imaginary
    }

    pub fn diagnostics(&self) -> &SolveDiagnostics {
        &self.diagnostics
    }

    pub fn warning(&self) -> Option<NumericalInstabilityWarning> {
        self.diagnostics.warning()
    }
}

/// Centre response of one node to the active stimulus
#[derive(Debug, Clone)]
pub struct Response {
    node: NodeId,
    center: Array1<f64>,
    max_imaginary: f64,
    diagnostics: SolveDiagnostics,
}

impl Response {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Time course at the spatial origin, one sample per grid time
    pub fn center(&self) -> &Array1<f64> {
        &self.center
    }

    pub fn max_imaginary(&self) -> f64 {
        self.max_imaginary
    }

    pub fn diagnostics(&self) -> &SolveDiagnostics {
        &self.diagnostics
    }

    pub fn warning(&self) -> Option<NumericalInstabilityWarning> {
        self.diagnostics.warning()
    }
}

impl Network {
    /// Solve the transfer functions, reusing the cached solve unless `recompute`.
    ///
    /// # Errors
    /// `Configuration` if the grid is unset or no ganglion cell injects the
    /// stimulus.
    pub fn solve(&mut self, recompute: bool) -> Result<&TransferFunctions> {
        let grid = self.grid()?;
        if !self.nodes().iter().any(|n| n.kind() == NodeKind::Ganglion) {
            return Err(LgnError::config(
                "network has no ganglion cell; nothing receives the stimulus",
            ));
        }

        let cached = match &self.transfer {
            Some(tf) if !recompute => grid.ensure_same_grid(tf.signature()).is_ok(),
            _ => false,
        };
        if !cached {
            let solved =
                solve_transfer_functions(grid, self.nodes(), self.edges(), self.solver_config());
            self.transfer = Some(solved);
        } else {
            debug!("Reusing cached transfer functions");
        }

        self.transfer
            .as_ref()
            .ok_or_else(|| LgnError::config("transfer functions unavailable"))
    }

    /// Impulse response of `node` (flat stimulus spectrum), also kept for
    /// [`last_impulse_response`](Network::last_impulse_response).
    pub fn compute_irf(&mut self, node: NodeId) -> Result<ImpulseResponse> {
        let index = self.check_node(node)?;
        let parallel = self.solver_config().parallel;
        self.solve(false)?;
        let grid = self.grid()?;
        let tf = self
            .transfer
            .as_ref()
            .ok_or_else(|| LgnError::config("transfer functions unavailable"))?;

        let field = spectrum_to_field(grid, tf.node(index).to_owned(), parallel);
        let result = ImpulseResponse {
            node,
            signature: grid.signature(),
            irf: field.values,
            max_imaginary: field.max_imaginary,
            diagnostics: *tf.diagnostics(),
        };
        report(node, "impulse response", result.max_imaginary, result.warning());

        self.impulse_responses.insert(index, result.clone());
        Ok(result)
    }

    /// Centre response of `node` to the active stimulus.
    ///
    /// `recompute_ft = false` reuses the cached transfer functions when the
    /// topology has not changed; the result is the same either way.
    ///
    /// # Errors
    /// `Configuration` if no stimulus is set, the handle is invalid or no
    /// ganglion cell exists.
    pub fn compute_response(&mut self, node: NodeId, recompute_ft: bool) -> Result<Response> {
        let index = self.check_node(node)?;
        let spectrum = self.active_spectrum()?;
        self.solve(recompute_ft)?;
        let grid = self.grid()?;
        let tf = self
            .transfer
            .as_ref()
            .ok_or_else(|| LgnError::config("transfer functions unavailable"))?;
        spectrum.ensure_grid(grid)?;

        let h = tf.node(index);
        let mut spatial_sum = vec![Complex64::new(0.0, 0.0); grid.nt()];
        match &spectrum {
            StimulusSpectrum::Flat => {
                for (it, sum) in spatial_sum.iter_mut().enumerate() {
                    *sum = h.slice(s![it, .., ..]).iter().sum();
                }
            }
            StimulusSpectrum::Sparse { components, .. } => {
                for component in components {
                    let it = component.temporal_index;
                    let plane = h.slice(s![it, .., ..]);
                    let contribution: Complex64 = plane
                        .iter()
                        .zip(&component.spatial)
                        .map(|(hv, sv)| hv * sv)
                        .sum();
                    spatial_sum[it] += contribution;
                }
            }
        }

        let course = center_time_course(grid, spatial_sum);
        let result = Response {
            node,
            center: course.values,
            max_imaginary: course.max_imaginary,
            diagnostics: *tf.diagnostics(),
        };
        report(node, "response", result.max_imaginary, result.warning());

        self.responses.insert(index, result.clone());
        Ok(result)
    }

    /// Full `(t, x, y)` response of `node` to the active stimulus.
    pub fn compute_response_field(&mut self, node: NodeId, recompute_ft: bool) -> Result<Array3<f64>> {
        let index = self.check_node(node)?;
        let spectrum = self.active_spectrum()?;
        let parallel = self.solver_config().parallel;
        self.solve(recompute_ft)?;
        let grid = self.grid()?;
        let tf = self
            .transfer
            .as_ref()
            .ok_or_else(|| LgnError::config("transfer functions unavailable"))?;
        spectrum.ensure_grid(grid)?;

        let h = tf.node(index);
        let product = match &spectrum {
            StimulusSpectrum::Flat => h.to_owned(),
            StimulusSpectrum::Sparse { components, .. } => {
                let nr = grid.nr();
                let mut product = Array3::<Complex64>::zeros(h.raw_dim());
                for component in components {
                    let it = component.temporal_index;
                    for ((ix, iy), out) in product.slice_mut(s![it, .., ..]).indexed_iter_mut() {
                        *out += h[[it, ix, iy]] * component.spatial[ix * nr + iy];
                    }
                }
                product
            }
        };

        let field = spectrum_to_field(grid, product, parallel);
        report(node, "response field", field.max_imaginary, tf.diagnostics().warning());
        Ok(field.values)
    }

    fn active_spectrum(&self) -> Result<StimulusSpectrum> {
        self.stimulus_spectrum()
            .cloned()
            .ok_or_else(|| LgnError::config("no stimulus set; call set_stimulus first"))
    }
}

fn report(node: NodeId, what: &str, max_imaginary: f64, warning: Option<NumericalInstabilityWarning>) {
    debug!(%node, max_imaginary, "Computed {what}");
    if let Some(warning) = warning {
        warn!(%node, %warning, "{what} computed with unstable feedback");
    }
}
