// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LGN Circuit Maths
//!
//! Everything that is evaluated pointwise on the frequency grid:
//! - **Integrator**: the discretised space-time grid and its frequency axes
//! - **Kernels**: closed-form spatial and temporal filter transforms
//! - **Stimulus**: patch-grating and impulse input spectra
//! - **Special**: Bessel J1 and the disk aperture transform
//!
//! Graph assembly, the transfer-function solve and the inverse transforms live
//! in `lgn-engine`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod integrator;
pub mod kernels;
pub mod special;
pub mod stimulus;

pub use error::{Error, LgnError, Result};
pub use integrator::{GridSignature, Integrator};
pub use kernels::{KernelPair, KernelShape, SpatialKernel, TemporalKernel};
pub use stimulus::{PatchGrating, Stimulus, StimulusSpectrum, TemporalComponent};
