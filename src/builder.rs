//! Fluent builder for network setup.
//!
//! Hides the boilerplate of creating a network, placing nodes in common
//! shapes, seeding node memory and binding algorithms.

use serde_json::Value;
use tracing::debug;

use crate::algorithm::AlgorithmBinding;
use crate::error::{SimError, SimResult};
use crate::network::{
    CommunicationModel, Environment, Network, NetworkConfig, Position, RangeType,
};
use crate::node::{Node, NodeId};

/// Margin between the environment border and generated shapes.
const MARGIN: f64 = 10.0;

// ── NetworkBuilder ────────────────────────────────────────────────────

/// Fluent builder for a [`Network`].
///
/// Nodes are created in the order they are placed, so placement index
/// `i` is also the `i`-th smallest id of the built network.
///
/// # Example
/// ```rust
/// use distsim::builder::NetworkBuilder;
/// use distsim::network::{CommunicationModel, CompleteRange};
///
/// let net = NetworkBuilder::new()
///     .seed(7)
///     .range(CompleteRange)
///     .communication(CommunicationModel::ideal())
///     .ring(6, 50.0)
///     .build()
///     .unwrap();
/// assert_eq!(net.len(), 6);
/// assert_eq!(net.edge_count(), 15);
/// ```
pub struct NetworkBuilder {
    config: NetworkConfig,
    range: Option<Box<dyn RangeType>>,
    environment: Option<Box<dyn Environment>>,
    communication: Option<CommunicationModel>,
    placements: Vec<Position>,
    memory: Vec<(usize, String, Value)>,
    labels: Vec<(usize, String)>,
    algorithms: Vec<AlgorithmBinding>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        NetworkBuilder {
            config: NetworkConfig::default(),
            range: None,
            environment: None,
            communication: None,
            placements: Vec::new(),
            memory: Vec::new(),
            labels: Vec::new(),
            algorithms: Vec::new(),
        }
    }

    // ── Network ───────────────────────────────────────────────

    /// Replace the whole config.
    pub fn config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn directed(mut self) -> Self {
        self.config.directed = true;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Deliver to non-neighbours instead of failing.
    pub fn routing(mut self, routing: bool) -> Self {
        self.config.routing = routing;
        self
    }

    /// Communication range of every node the builder creates.
    pub fn comm_range(mut self, comm_range: f64) -> Self {
        self.config.default_comm_range = comm_range;
        self
    }

    pub fn range(mut self, range: impl RangeType + 'static) -> Self {
        self.range = Some(Box::new(range));
        self
    }

    pub fn environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Some(Box::new(environment));
        self
    }

    pub fn communication(mut self, communication: CommunicationModel) -> Self {
        self.communication = Some(communication);
        self
    }

    // ── Placement ─────────────────────────────────────────────

    pub fn point(mut self, x: f64, y: f64) -> Self {
        self.placements.push(Position::new(x, y));
        self
    }

    pub fn points<I, P>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Position>,
    {
        self.placements.extend(points.into_iter().map(Into::into));
        self
    }

    /// `cols` x `rows` nodes, `spacing` apart, filled row by row.
    pub fn grid(mut self, cols: usize, rows: usize, spacing: f64) -> Self {
        for row in 0..rows {
            for col in 0..cols {
                self.placements.push(Position::new(
                    MARGIN + col as f64 * spacing,
                    MARGIN + row as f64 * spacing,
                ));
            }
        }
        self
    }

    /// `n` nodes on a horizontal line, `spacing` apart.
    pub fn line(self, n: usize, spacing: f64) -> Self {
        self.grid(n, 1, spacing)
    }

    /// `n` nodes evenly spaced on a circle of `radius`.
    pub fn ring(mut self, n: usize, radius: f64) -> Self {
        let center = MARGIN + radius;
        for i in 0..n {
            let angle = std::f64::consts::TAU * i as f64 / n as f64;
            self.placements.push(Position::new(
                center + radius * angle.cos(),
                center + radius * angle.sin(),
            ));
        }
        self
    }

    // ── Node state ────────────────────────────────────────────

    /// Seed the memory of the node at placement `index`.
    pub fn memory(mut self, index: usize, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.memory.push((index, key.into(), value.into()));
        self
    }

    pub fn label(mut self, index: usize, label: impl Into<String>) -> Self {
        self.labels.push((index, label.into()));
        self
    }

    // ── Algorithms ────────────────────────────────────────────

    /// Bind an algorithm. Algorithms run in the order they are added.
    pub fn algorithm(mut self, binding: AlgorithmBinding) -> Self {
        self.algorithms.push(binding);
        self
    }

    // ── Build ─────────────────────────────────────────────────

    /// Create the network, place every node and bind the algorithms.
    pub fn build(self) -> SimResult<Network> {
        let mut network = Network::new(self.config);
        if let Some(environment) = self.environment {
            network.set_environment(environment);
        }
        if let Some(range) = self.range {
            network.set_range(range);
        }
        if let Some(communication) = self.communication {
            network.set_communication(communication);
        }

        let mut ids: Vec<NodeId> = Vec::with_capacity(self.placements.len());
        for position in self.placements {
            let node = Node::with_comm_range(self.config.default_comm_range);
            ids.push(network.add_node(node, Some(position))?);
        }

        let lookup = |index: usize| {
            ids.get(index).copied().ok_or(SimError::InvalidParam {
                algorithm: "NetworkBuilder".into(),
                param: "index".into(),
                reason: format!("no node placed at index {}", index),
            })
        };
        for (index, key, value) in self.memory {
            let id = lookup(index)?;
            network.node_mut(id)?.memory.insert(key, value);
        }
        for (index, label) in self.labels {
            let id = lookup(index)?;
            network.set_label(id, label)?;
        }

        network.set_algorithms(self.algorithms)?;
        debug!(
            nodes = network.len(),
            edges = network.edge_count(),
            algorithms = network.algorithm_count(),
            "network built"
        );
        Ok(network)
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
