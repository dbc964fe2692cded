// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Closed-form properties of the transfer-function solve.
//!
//! Pass-through identity, feed-forward cascades, the single self-loop
//! geometric series and clear/rebuild equivalence.

mod common;

use common::{build_circuit, reference_network, Branch};
use lgn::prelude::*;
use num_complex::Complex64;

fn small_network() -> Network {
    Network::with_integrator(3, 4, 1.0, 0.25).expect("grid")
}

fn close(a: Complex64, b: Complex64, tol: f64) -> bool {
    (a - b).norm() <= tol * (1.0 + b.norm())
}

#[test]
fn test_dc_gains() {
    let gauss = SpatialKernel::gaussian(2.5, 0.7).unwrap();
    assert_eq!(gauss.gain(0.0, 0.0), Complex64::new(2.5, 0.0));

    let dog = SpatialKernel::difference_of_gaussians(1.0, 0.62, 0.85, 1.26).unwrap();
    assert!((dog.gain(0.0, 0.0).re - 0.15).abs() < 1e-12);

    let delta = KernelPair::identity();
    for (kx, ky, w) in [(0.0, 0.0, 0.0), (3.0, -1.0, 0.4), (-20.0, 7.5, -9.0)] {
        assert_eq!(delta.gain(kx, ky, w), Complex64::new(1.0, 0.0));
    }

    let decay = TemporalKernel::exponential_decay(12.0, 4.0).unwrap();
    assert!((decay.gain(0.0) - Complex64::new(1.0, 0.0)).norm() < 1e-15);
}

#[test]
fn test_delta_chain_passes_ganglion_response_through() {
    let mut network = small_network();
    let ganglion = network
        .create_ganglion_cell(KernelPair::new(
            SpatialKernel::gaussian(1.0, 0.4).unwrap(),
            TemporalKernel::exponential_decay(2.0, 0.0).unwrap(),
        ))
        .unwrap();
    let relay = network.create_relay_cell().unwrap();
    let cortex = network.create_cortical_cell().unwrap();
    network
        .connect(ganglion, relay, KernelPair::identity(), 1.0)
        .unwrap();
    network
        .connect(relay, cortex, KernelPair::identity(), 1.0)
        .unwrap();

    let source = network.compute_irf(ganglion).unwrap();
    let peak = source.irf().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    for node in [relay, cortex] {
        let irf = network.compute_irf(node).unwrap();
        for (a, b) in irf.irf().iter().zip(source.irf().iter()) {
            assert!((a - b).abs() <= 1e-12 * peak, "{a} vs {b}");
        }
    }
}

#[test]
fn test_feed_forward_solve_is_kernel_cascade() {
    let input = KernelPair::new(
        SpatialKernel::difference_of_gaussians(1.0, 0.3, 0.5, 0.9).unwrap(),
        TemporalKernel::biphasic(6.0, 0.4, 0.0).unwrap(),
    );
    let first = KernelPair::new(
        SpatialKernel::gaussian(1.0, 0.2).unwrap(),
        TemporalKernel::exponential_decay(1.5, 1.0).unwrap(),
    );
    let second = KernelPair::new(
        SpatialKernel::delta_shifted(0.25, -0.5).unwrap(),
        TemporalKernel::delta_delayed(2.0).unwrap(),
    );
    let (w1, w2) = (0.8, -1.7);

    let mut network = small_network();
    let ganglion = network.create_ganglion_cell(input).unwrap();
    let relay = network.create_relay_cell().unwrap();
    let cortex = network.create_cortical_cell().unwrap();
    network.connect(ganglion, relay, first, w1).unwrap();
    network.connect(relay, cortex, second, w2).unwrap();

    let grid = network.integrator().unwrap().clone();
    let tf = network.solve(false).unwrap();
    assert!(tf.diagnostics().is_stable());
    let cortical = tf.node(cortex.index());

    for (it, &w) in grid.temporal_freqs().iter().enumerate() {
        for (ix, &kx) in grid.spatial_freqs().iter().enumerate() {
            for (iy, &ky) in grid.spatial_freqs().iter().enumerate() {
                let expected = input.gain(kx, ky, w)
                    * w1
                    * first.gain(kx, ky, w)
                    * w2
                    * second.gain(kx, ky, w);
                assert!(close(cortical[[it, ix, iy]], expected, 1e-12));
            }
        }
    }
}

#[test]
fn test_self_loop_is_geometric_series() {
    let input = KernelPair::new(
        SpatialKernel::gaussian(1.0, 0.3).unwrap(),
        TemporalKernel::exponential_decay(1.0, 0.0).unwrap(),
    );
    let loop_kernel = KernelPair::new(
        SpatialKernel::gaussian(1.0, 0.6).unwrap(),
        TemporalKernel::exponential_decay(3.0, 1.0).unwrap(),
    );
    let weight = -0.7;

    let mut network = small_network();
    let ganglion = network.create_ganglion_cell(input).unwrap();
    network
        .connect(ganglion, ganglion, loop_kernel, weight)
        .unwrap();

    let grid = network.integrator().unwrap().clone();
    let tf = network.solve(false).unwrap();
    let response = tf.node(ganglion.index());

    for (it, &w) in grid.temporal_freqs().iter().enumerate() {
        for (ix, &kx) in grid.spatial_freqs().iter().enumerate() {
            for (iy, &ky) in grid.spatial_freqs().iter().enumerate() {
                let g = weight * loop_kernel.gain(kx, ky, w);
                assert!(g.norm() < 1.0);
                let expected = input.gain(kx, ky, w) / (Complex64::new(1.0, 0.0) - g);
                assert!(close(response[[it, ix, iy]], expected, 1e-12));
            }
        }
    }
}

#[test]
fn test_clear_then_rebuild_matches_fresh_network() {
    let center = Branch::new(1.0, 0.1, -0.3);
    let surround = Branch::new(1.0, 0.9, 0.2);

    let mut fresh = reference_network();
    let fresh_circuit = build_circuit(&mut fresh, center, surround);
    let expected = fresh.compute_irf(fresh_circuit.relay).unwrap();

    let mut reused = reference_network();
    let first = build_circuit(&mut reused, Branch::new(1.0, 0.1, 0.4), surround);
    let _ = reused.compute_irf(first.relay).unwrap();
    reused.clear();
    assert_eq!(reused.node_count(), 0);
    assert!(reused.transfer_functions().is_none());
    assert!(reused.integrator().is_some());

    let rebuilt = build_circuit(&mut reused, center, surround);
    let actual = reused.compute_irf(rebuilt.relay).unwrap();
    assert_eq!(actual.irf(), expected.irf());
    assert_eq!(actual.diagnostics(), expected.diagnostics());

    // Handles from before clear() are stale
    let err = reused.compute_irf(first.relay).unwrap_err();
    assert!(matches!(err, LgnError::Configuration(_)));
}

#[test]
fn test_handles_are_scoped_to_their_network() {
    let mut a = small_network();
    let mut b = small_network();
    let ganglion = a.create_ganglion_cell(KernelPair::identity()).unwrap();
    let relay = b.create_relay_cell().unwrap();

    assert!(matches!(
        b.connect(ganglion, relay, KernelPair::identity(), 1.0),
        Err(LgnError::Configuration(_))
    ));
    assert!(a.compute_irf(relay).is_err());
    assert!(b.last_impulse_response(ganglion).is_err());
}

#[test]
fn test_invalid_parameters_fail_at_construction() {
    assert!(SpatialKernel::gaussian(1.0, -0.1).is_err());
    assert!(TemporalKernel::exponential_decay(f64::NAN, 0.0).is_err());
    assert!(Integrator::new(3, 3, 0.0, 0.1).is_err());

    let mut network = Network::new();
    assert!(network.create_relay_cell().is_err());
    network.create_integrator(2, 2, 1.0, 1.0).unwrap();
    assert!(network.create_integrator(2, 2, 1.0, 1.0).is_err());

    let a = network.create_relay_cell().unwrap();
    let b = network.create_relay_cell().unwrap();
    assert!(network
        .connect(a, b, KernelPair::identity(), f64::INFINITY)
        .is_err());
}

#[test]
fn test_solve_without_ganglion_is_configuration_error() {
    let mut network = small_network();
    let relay = network.create_relay_cell().unwrap();
    assert!(matches!(
        network.compute_irf(relay),
        Err(LgnError::Configuration(_))
    ));
}

#[test]
fn test_serial_and_parallel_solves_agree() {
    let build = |parallel: bool| {
        let mut network = reference_network();
        let config = SolverConfig {
            parallel,
            ..*network.solver_config()
        };
        network.set_solver_config(config).unwrap();
        let circuit = build_circuit(
            &mut network,
            Branch::new(1.0, 0.1, -0.3),
            Branch::new(1.0, 0.9, -0.3),
        );
        network.compute_irf(circuit.relay).unwrap()
    };

    let serial = build(false);
    let parallel = build(true);
    assert_eq!(serial.irf(), parallel.irf());
}
