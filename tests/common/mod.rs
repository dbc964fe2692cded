// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared circuit builders for the integration tests.

#![allow(dead_code)]

use lgn::prelude::*;

/// Handles of the ganglion → relay ⇄ cortical (centre, surround) circuit
pub struct Circuit {
    pub ganglion: NodeId,
    pub relay: NodeId,
    pub center: NodeId,
    pub surround: NodeId,
}

/// Feedback branch: `gauss(amplitude, width) × expDecay(1, 0)` with `weight`
#[derive(Clone, Copy)]
pub struct Branch {
    pub amplitude: f64,
    pub width: f64,
    pub weight: f64,
}

impl Branch {
    pub fn new(amplitude: f64, width: f64, weight: f64) -> Self {
        Self {
            amplitude,
            width,
            weight,
        }
    }

    fn kernel(&self) -> KernelPair {
        KernelPair::new(
            SpatialKernel::gaussian(self.amplitude, self.width).expect("gaussian"),
            TemporalKernel::exponential_decay(1.0, 0.0).expect("decay"),
        )
    }
}

/// Retinal ganglion receptive field: `biphasic(42.5, 0.38, 0) × dog(1, 0.62, 0.85, 1.26)`
pub fn ganglion_kernel() -> KernelPair {
    KernelPair::new(
        SpatialKernel::difference_of_gaussians(1.0, 0.62, 0.85, 1.26).expect("dog"),
        TemporalKernel::biphasic(42.5, 0.38, 0.0).expect("biphasic"),
    )
}

/// Populate `network` with the canonical circuit.
pub fn build_circuit(network: &mut Network, center: Branch, surround: Branch) -> Circuit {
    let ganglion = network
        .create_ganglion_cell(ganglion_kernel())
        .expect("ganglion");
    let relay = network.create_relay_cell().expect("relay");
    let center_cell = network.create_cortical_cell().expect("centre");
    let surround_cell = network.create_cortical_cell().expect("surround");

    network
        .connect(
            ganglion,
            relay,
            KernelPair::new(
                SpatialKernel::gaussian(1.0, 0.1).expect("gaussian"),
                TemporalKernel::exponential_decay(1.0, 0.0).expect("decay"),
            ),
            1.0,
        )
        .expect("ganglion -> relay");
    network
        .connect(relay, center_cell, KernelPair::identity(), 1.0)
        .expect("relay -> centre");
    network
        .connect(relay, surround_cell, KernelPair::identity(), 1.0)
        .expect("relay -> surround");
    network
        .connect(center_cell, relay, center.kernel(), center.weight)
        .expect("centre -> relay");
    network
        .connect(surround_cell, relay, surround.kernel(), surround.weight)
        .expect("surround -> relay");

    Circuit {
        ganglion,
        relay,
        center: center_cell,
        surround: surround_cell,
    }
}

/// The `Nt = 2, Nr = 128, dt = 1, dr = 0.1` grid used by the reference scenarios
pub fn reference_network() -> Network {
    Network::with_integrator(1, 7, 1.0, 0.1).expect("grid")
}

/// Largest absolute value of an iterator of samples
pub fn max_abs<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    values.into_iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}
