// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LGN - Frequency-Domain Early Visual Pathway Simulation
//!
//! Models the retina → lateral geniculate nucleus → cortex circuit as a network
//! of linear populations joined by closed-form Fourier-domain kernels, and
//! computes impulse and stimulus responses entirely in frequency space with a
//! single inverse transform at the end.
//!
//! ## Quick Start
//!
//! ```rust
//! use lgn::prelude::*;
//!
//! let mut network = Network::with_integrator(1, 7, 1.0, 0.1)?;
//! let ganglion = network.create_ganglion_cell(KernelPair::new(
//!     SpatialKernel::difference_of_gaussians(1.0, 0.62, 0.85, 1.26)?,
//!     TemporalKernel::biphasic(42.5, 0.38, 0.0)?,
//! ))?;
//! let relay = network.create_relay_cell()?;
//! network.connect(
//!     ganglion,
//!     relay,
//!     (SpatialKernel::gaussian(1.0, 0.1)?, TemporalKernel::exponential_decay(1.0, 0.0)?),
//!     1.0,
//! )?;
//!
//! let irf = network.compute_irf(relay)?;
//! assert!(irf.center_irf()[0] > 0.0);
//! # Ok::<(), LgnError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: lgn-neural, lgn-config                     │
//! │  (grid, kernels, stimuli, configuration)                │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Compute: lgn-engine                                    │
//! │  (network graph, feedback solve, inverse transforms)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: lgn-observability                      │
//! │  (tracing subscriber, per-crate debug flags)            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use lgn_config as config;
pub use lgn_engine as engine;
pub use lgn_neural as neural;
pub use lgn_observability as observability;

/// Prelude - commonly used types
pub mod prelude {
    pub use lgn_config::{LgnConfig, SolverConfig};
    pub use lgn_engine::{
        ImpulseResponse, Network, NodeId, NodeKind, NumericalInstabilityWarning, Response,
        SolveDiagnostics,
    };
    pub use lgn_neural::{
        Integrator, KernelPair, KernelShape, LgnError, PatchGrating, SpatialKernel, Stimulus,
        TemporalKernel,
    };
}
