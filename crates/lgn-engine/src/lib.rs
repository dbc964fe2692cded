// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LGN Engine
//!
//! Frequency-domain evaluation of retina → LGN → cortex circuits.
//!
//! ## Pipeline
//! 1. **Network**: nodes (ganglion, relay, cortical) and weighted kernel-pair edges
//! 2. **Solver**: `(I - M)·R = s` at every grid point, feedback included
//! 3. **Evaluator**: multiply by the stimulus spectrum and inverse-transform
//!
//! ## Example
//! ```rust
//! use lgn_engine::Network;
//! use lgn_neural::{KernelPair, SpatialKernel, TemporalKernel};
//!
//! let mut network = Network::with_integrator(3, 4, 1.0, 0.1)?;
//! let ganglion = network.create_ganglion_cell(KernelPair::new(
//!     SpatialKernel::gaussian(1.0, 0.2)?,
//!     TemporalKernel::exponential_decay(2.0, 0.0)?,
//! ))?;
//! let relay = network.create_relay_cell()?;
//! network.connect(ganglion, relay, KernelPair::identity(), 1.0)?;
//!
//! let irf = network.compute_irf(relay)?;
//! assert_eq!(irf.center_irf().len(), 8);
//! # Ok::<(), lgn_neural::LgnError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod fft;
pub mod network;
pub mod response;
pub mod solver;

pub use network::{Edge, Network, Node, NodeId, NodeKind};
pub use response::{ImpulseResponse, Response};
pub use solver::{
    solve_transfer_functions, GridPoint, NumericalInstabilityWarning, SolveDiagnostics,
    TransferFunctions,
};

pub use lgn_config::SolverConfig;
pub use lgn_neural::{LgnError, Result};
