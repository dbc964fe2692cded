// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Graph
//!
//! Nodes are neural populations (ganglion, relay, cortical); edges are weighted
//! kernel pairs. Cycles are allowed: relay ⇄ cortical feedback is resolved by
//! the per-grid-point linear solve, not by graph traversal.
//!
//! ## Lifecycle
//! ```text
//! Network::new()
//!   └─ create_integrator(nt, nr, dt, dr)      exactly once
//!        ├─ create_*_cell / connect            topology
//!        ├─ set_stimulus                       input
//!        ├─ compute_irf / compute_response     evaluation (cached solve)
//!        └─ clear()                            drop topology, keep the grid
//! ```
//!
//! Node handles are tied to one network and one generation: after `clear()`
//! (or on another network) an old handle is rejected rather than aliasing a
//! new node.

use core::fmt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use lgn_config::{IntegratorConfig, LgnConfig, SolverConfig};
use lgn_neural::{Integrator, KernelPair, LgnError, Result, Stimulus, StimulusSpectrum};
use tracing::{debug, info};

use crate::response::{ImpulseResponse, Response};
use crate::solver::TransferFunctions;

static NEXT_NETWORK_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a node inside one [`Network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    network: u64,
    generation: u64,
    index: usize,
}

impl NodeId {
    /// Position in [`Network::nodes`] (and in the solved response vector)
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.index)
    }
}

/// Population category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Receives the stimulus through its own receptive-field kernel
    Ganglion,
    Relay,
    Cortical,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Ganglion => "ganglion",
            NodeKind::Relay => "relay",
            NodeKind::Cortical => "cortical",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    input_kernel: Option<KernelPair>,
    label: Option<String>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Receptive-field kernel applied to the stimulus (ganglion cells only)
    pub fn input_kernel(&self) -> Option<&KernelPair> {
        self.input_kernel.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Directed weighted connection `source -> target`
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kernel: KernelPair,
    /// Signed; negative for inhibition
    pub weight: f64,
}

/// Caller-owned circuit: one grid, its nodes and edges, an optional stimulus
/// and the cached results computed against them.
#[derive(Debug)]
pub struct Network {
    id: u64,
    generation: u64,
    integrator: Option<Integrator>,
    solver_config: SolverConfig,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    stimulus: Option<(Stimulus, StimulusSpectrum)>,
    pub(crate) transfer: Option<TransferFunctions>,
    pub(crate) impulse_responses: HashMap<usize, ImpulseResponse>,
    pub(crate) responses: HashMap<usize, Response>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Empty network without a grid
    pub fn new() -> Self {
        Self {
            id: NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            integrator: None,
            solver_config: SolverConfig::default(),
            nodes: Vec::new(),
            edges: Vec::new(),
            stimulus: None,
            transfer: None,
            impulse_responses: HashMap::new(),
            responses: HashMap::new(),
        }
    }

    /// Network with its grid already created
    pub fn with_integrator(nt: u32, nr: u32, dt: f64, dr: f64) -> Result<Self> {
        let mut network = Self::new();
        network.create_integrator(nt, nr, dt, dr)?;
        Ok(network)
    }

    /// Network built from the `[integrator]` and `[solver]` configuration sections
    pub fn from_config(config: &LgnConfig) -> Result<Self> {
        let IntegratorConfig { nt, nr, dt, dr } = config.integrator;
        let mut network = Self::with_integrator(nt, nr, dt, dr)?;
        network.set_solver_config(config.solver)?;
        Ok(network)
    }

    /// Create the grid. Allowed exactly once per network.
    pub fn create_integrator(&mut self, nt: u32, nr: u32, dt: f64, dr: f64) -> Result<&Integrator> {
        if self.integrator.is_some() {
            return Err(LgnError::config(
                "create_integrator: network already has an integrator",
            ));
        }
        let grid = Integrator::new(nt, nr, dt, dr)?;
        info!(
            network = self.id,
            nt = grid.nt(),
            nr = grid.nr(),
            dt,
            dr,
            "Created integrator"
        );
        Ok(self.integrator.insert(grid))
    }

    pub fn integrator(&self) -> Option<&Integrator> {
        self.integrator.as_ref()
    }

    pub(crate) fn grid(&self) -> Result<&Integrator> {
        self.integrator
            .as_ref()
            .ok_or_else(|| LgnError::config("network has no integrator; call create_integrator first"))
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver_config
    }

    /// Replace the solver settings (drops the cached solve).
    pub fn set_solver_config(&mut self, config: SolverConfig) -> Result<()> {
        let tol = config.singularity_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(LgnError::config(format!(
                "singularity_tolerance must be finite and >= 0 (got {tol})"
            )));
        }
        self.solver_config = config;
        self.invalidate();
        Ok(())
    }

    pub fn create_ganglion_cell(&mut self, kernel: KernelPair) -> Result<NodeId> {
        self.add_node(NodeKind::Ganglion, Some(kernel))
    }

    pub fn create_relay_cell(&mut self) -> Result<NodeId> {
        self.add_node(NodeKind::Relay, None)
    }

    pub fn create_cortical_cell(&mut self) -> Result<NodeId> {
        self.add_node(NodeKind::Cortical, None)
    }

    fn add_node(&mut self, kind: NodeKind, input_kernel: Option<KernelPair>) -> Result<NodeId> {
        self.grid()?;
        let id = NodeId {
            network: self.id,
            generation: self.generation,
            index: self.nodes.len(),
        };
        self.nodes.push(Node {
            id,
            kind,
            input_kernel,
            label: None,
        });
        self.invalidate();
        debug!(network = self.id, node = %id, %kind, "Created node");
        Ok(id)
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        let index = self.check_node(id)?;
        self.nodes[index].label = Some(label.into());
        Ok(())
    }

    /// Add `source -> target` with the given kernel pair and signed weight.
    ///
    /// # Errors
    /// `Configuration` if the grid is unset, either handle is foreign or
    /// stale, or the weight is not finite.
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        kernel: impl Into<KernelPair>,
        weight: f64,
    ) -> Result<()> {
        self.grid()?;
        self.check_node(source)?;
        self.check_node(target)?;
        if !weight.is_finite() {
            return Err(LgnError::config(format!(
                "connect {source} -> {target}: weight must be finite (got {weight})"
            )));
        }
        self.edges.push(Edge {
            source,
            target,
            kernel: kernel.into(),
            weight,
        });
        self.invalidate();
        debug!(network = self.id, %source, %target, weight, "Connected nodes");
        Ok(())
    }

    /// Evaluate `stimulus` on the grid and make it the active input.
    ///
    /// # Errors
    /// `Configuration` if the grid is unset, a dimension mismatch if the
    /// stimulus needs a frequency that is not on the grid.
    pub fn set_stimulus(&mut self, stimulus: impl Into<Stimulus>) -> Result<()> {
        let stimulus = stimulus.into();
        let spectrum = stimulus.spectrum(self.grid()?)?;
        self.stimulus = Some((stimulus, spectrum));
        Ok(())
    }

    pub fn clear_stimulus(&mut self) {
        self.stimulus = None;
    }

    pub fn stimulus(&self) -> Option<&Stimulus> {
        self.stimulus.as_ref().map(|(stimulus, _)| stimulus)
    }

    pub(crate) fn stimulus_spectrum(&self) -> Option<&StimulusSpectrum> {
        self.stimulus.as_ref().map(|(_, spectrum)| spectrum)
    }

    /// Drop every node, edge, stimulus and cached result. The grid and solver
    /// settings are kept; handles issued before the call become invalid.
    pub fn clear(&mut self) {
        info!(
            network = self.id,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "Clearing network"
        );
        self.generation += 1;
        self.nodes.clear();
        self.edges.clear();
        self.stimulus = None;
        self.invalidate();
    }

    /// Drop results that depend on the topology.
    fn invalidate(&mut self) {
        self.transfer = None;
        self.impulse_responses.clear();
        self.responses.clear();
    }

    /// Index of `id`, or `Configuration` if it does not belong to this network
    /// in its current generation.
    pub(crate) fn check_node(&self, id: NodeId) -> Result<usize> {
        if id.network != self.id {
            return Err(LgnError::config(format!(
                "{id} belongs to another network"
            )));
        }
        if id.generation != self.generation {
            return Err(LgnError::config(format!(
                "{id} was invalidated by clear()"
            )));
        }
        if id.index >= self.nodes.len() {
            return Err(LgnError::config(format!("{id} does not exist")));
        }
        Ok(id.index)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        let index = self.check_node(id)?;
        Ok(&self.nodes[index])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges whose target is `id`
    pub fn edges_into(&self, id: NodeId) -> Result<impl Iterator<Item = &Edge>> {
        self.check_node(id)?;
        Ok(self.edges.iter().filter(move |edge| edge.target == id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Cached solve, if the topology has not changed since it was computed
    pub fn transfer_functions(&self) -> Option<&TransferFunctions> {
        self.transfer.as_ref()
    }

    /// Most recent [`compute_irf`](Network::compute_irf) result for `id`
    pub fn last_impulse_response(&self, id: NodeId) -> Result<Option<&ImpulseResponse>> {
        let index = self.check_node(id)?;
        Ok(self.impulse_responses.get(&index))
    }

    /// Most recent [`compute_response`](Network::compute_response) result for `id`
    pub fn last_response(&self, id: NodeId) -> Result<Option<&Response>> {
        let index = self.check_node(id)?;
        Ok(self.responses.get(&index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgn_neural::{PatchGrating, SpatialKernel, TemporalKernel};

    fn network() -> Network {
        Network::with_integrator(3, 3, 1.0, 0.1).unwrap()
    }

    #[test]
    fn test_nodes_require_integrator() {
        let mut network = Network::new();
        let err = network.create_relay_cell().unwrap_err();
        assert!(matches!(err, LgnError::Configuration(_)));
        assert!(network.create_ganglion_cell(KernelPair::identity()).is_err());
    }

    #[test]
    fn test_integrator_is_created_once() {
        let mut network = network();
        assert!(network.create_integrator(3, 3, 1.0, 0.1).is_err());
        assert_eq!(network.integrator().unwrap().nt(), 8);
    }

    #[test]
    fn test_invalid_grid_leaves_network_without_integrator() {
        let mut network = Network::new();
        assert!(network.create_integrator(3, 3, -1.0, 0.1).is_err());
        assert!(network.integrator().is_none());
        assert!(network.create_integrator(3, 3, 1.0, 0.1).is_ok());
    }

    #[test]
    fn test_connect_and_read_back() {
        let mut network = network();
        let ganglion = network.create_ganglion_cell(KernelPair::identity()).unwrap();
        let relay = network.create_relay_cell().unwrap();
        let cortical = network.create_cortical_cell().unwrap();
        network.set_label(relay, "relay").unwrap();

        network.connect(ganglion, relay, KernelPair::identity(), 1.0).unwrap();
        network.connect(relay, cortical, KernelPair::identity(), 1.0).unwrap();
        network.connect(cortical, relay, KernelPair::identity(), -0.5).unwrap();

        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edges().len(), 3);
        assert_eq!(network.node(relay).unwrap().kind(), NodeKind::Relay);
        assert_eq!(network.node(relay).unwrap().label(), Some("relay"));
        assert!(network.node(ganglion).unwrap().input_kernel().is_some());
        assert_eq!(network.edges_into(relay).unwrap().count(), 2);
    }

    #[test]
    fn test_self_loop_is_allowed() {
        let mut network = network();
        let relay = network.create_relay_cell().unwrap();
        assert!(network.connect(relay, relay, KernelPair::identity(), 0.3).is_ok());
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut a = network();
        let mut b = network();
        let in_a = a.create_relay_cell().unwrap();
        let in_b = b.create_relay_cell().unwrap();
        let err = a.connect(in_a, in_b, KernelPair::identity(), 1.0).unwrap_err();
        assert!(matches!(err, LgnError::Configuration(_)));
        assert!(a.node(in_b).is_err());
    }

    #[test]
    fn test_clear_invalidates_handles_and_keeps_grid() {
        let mut network = network();
        let old = network.create_relay_cell().unwrap();
        network.set_stimulus(Stimulus::Impulse).unwrap();
        network.clear();

        assert_eq!(network.node_count(), 0);
        assert!(network.stimulus().is_none());
        assert!(network.integrator().is_some());

        let new = network.create_relay_cell().unwrap();
        assert_eq!(new.index(), old.index());
        assert!(network.node(old).is_err());
        assert!(network.connect(old, new, KernelPair::identity(), 1.0).is_err());
        assert!(network.node(new).is_ok());
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let mut network = network();
        let a = network.create_relay_cell().unwrap();
        let b = network.create_cortical_cell().unwrap();
        assert!(network.connect(a, b, KernelPair::identity(), f64::NAN).is_err());
        assert!(network.edges().is_empty());
    }

    #[test]
    fn test_kernel_tuple_converts() {
        let mut network = network();
        let a = network.create_relay_cell().unwrap();
        let b = network.create_cortical_cell().unwrap();
        let kernel = (
            SpatialKernel::gaussian(1.0, 0.1).unwrap(),
            TemporalKernel::exponential_decay(1.0, 0.0).unwrap(),
        );
        network.connect(a, b, kernel, 1.0).unwrap();
        assert_eq!(network.edges()[0].kernel.spatial.shape().to_string(), "gaussian");
    }

    #[test]
    fn test_stimulus_requires_grid_and_on_grid_frequency() {
        let mut bare = Network::new();
        assert!(bare.set_stimulus(Stimulus::Impulse).is_err());

        let mut network = network();
        let dw = network.integrator().unwrap().dw();
        let off_grid = PatchGrating::new(0.0, 0.5 * dw, 1.0).unwrap();
        let err = network.set_stimulus(off_grid).unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert!(network.stimulus().is_none());

        let on_grid = PatchGrating::new(0.0, dw, 1.0).unwrap();
        network.set_stimulus(on_grid).unwrap();
        assert!(matches!(network.stimulus(), Some(Stimulus::PatchGrating(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = LgnConfig::default();
        config.integrator.nt = 2;
        config.integrator.nr = 3;
        config.solver.parallel = false;
        let network = Network::from_config(&config).unwrap();
        assert_eq!(network.integrator().unwrap().nr(), 8);
        assert!(!network.solver_config().parallel);

        config.solver.singularity_tolerance = -1.0;
        assert!(Network::from_config(&config).is_err());
    }
}
