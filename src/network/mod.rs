//! The network: an arena that owns every node, the edges between them,
//! the transport pools and the algorithms bound to it.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`config`] | [`NetworkConfig`] |
//! | [`range`] | [`Position`], [`Environment`], [`RangeType`] predicates |
//! | [`communication`] | [`CommunicationModel`], delay and loss policies |
//! | [`graph`] | adjacency queries and connectivity |
//! | [`transport`] | `communicate()` and the in-transit/lost pools |

pub mod communication;
pub mod config;
pub mod graph;
pub mod range;
pub mod transport;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::algorithm::{Algorithm, AlgorithmBinding, AlgorithmSchedule, AlgorithmState};
use crate::error::{SimError, SimResult};
use crate::message::{Destination, Message};
use crate::node::{Node, NodeId};
use crate::observer::{Observer, Observers, SimEvent};

pub use communication::{
    CommunicationModel, DelayPolicy, FirstMessageDelay, LossPolicy, MessageOrdering,
    NetworkSizeDelay, NoDelay, NoLoss, RandomDelay, RandomLoss, TransportView, UsageDelay,
};
pub use config::NetworkConfig;
pub use range::{
    CompleteRange, Endpoint, Environment, OpenEnvironment, Position, RangeType, SquareDisc,
    UnitDisc,
};
pub use transport::InTransit;

static NEXT_NETWORK_ID: AtomicU64 = AtomicU64::new(0);

// ── Network ID ────────────────────────────────────────────────────────

/// Identity of a network, recorded on the nodes it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkId(u64);

impl NetworkId {
    fn fresh() -> Self {
        NetworkId(NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Net{}", self.0)
    }
}

// ── Network ───────────────────────────────────────────────────────────

/// Owns nodes, placement, edges, transport state and algorithm bindings.
///
/// Edges are derived from positions and the range predicate; they are
/// recalculated whenever a node is added, moved or changes its range.
#[derive(Debug)]
pub struct Network {
    id: NetworkId,
    config: NetworkConfig,
    nodes: BTreeMap<NodeId, Node>,
    positions: BTreeMap<NodeId, Position>,
    orientations: BTreeMap<NodeId, f64>,
    labels: BTreeMap<NodeId, String>,
    /// Out-neighbours. Symmetric when the network is undirected.
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    range: Box<dyn RangeType>,
    environment: Box<dyn Environment>,
    communication: CommunicationModel,
    transit: BTreeMap<(NodeId, NodeId), Vec<InTransit>>,
    lost: BTreeMap<(NodeId, NodeId), Vec<Message>>,
    rng: ChaCha8Rng,
    schedule: AlgorithmSchedule,
    observers: Observers,
}

impl Network {
    /// An empty network using unit-disc edges in an open environment.
    pub fn new(config: NetworkConfig) -> Self {
        Network {
            id: NetworkId::fresh(),
            config,
            nodes: BTreeMap::new(),
            positions: BTreeMap::new(),
            orientations: BTreeMap::new(),
            labels: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            range: Box::new(UnitDisc),
            environment: Box::new(OpenEnvironment::default()),
            communication: CommunicationModel::default(),
            transit: BTreeMap::new(),
            lost: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            schedule: AlgorithmSchedule::default(),
            observers: Observers::new(),
        }
    }

    /// Builder: replace the range predicate. Existing edges are rebuilt.
    pub fn with_range(mut self, range: impl RangeType + 'static) -> Self {
        self.set_range(Box::new(range));
        self
    }

    /// Builder: replace the environment.
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.set_environment(Box::new(environment));
        self
    }

    pub fn set_range(&mut self, range: Box<dyn RangeType>) {
        self.range = range;
        self.recalculate_all_edges();
        self.observers.notify(SimEvent::NetworkChanged);
    }

    /// Replace the environment. Placed nodes stay where they are.
    pub fn set_environment(&mut self, environment: Box<dyn Environment>) {
        self.environment = environment;
        self.recalculate_all_edges();
        self.observers.notify(SimEvent::NetworkChanged);
    }

    /// Builder: replace the communication model.
    pub fn with_communication(mut self, communication: CommunicationModel) -> Self {
        self.communication = communication;
        self
    }

    #[inline]
    pub fn id(&self) -> NetworkId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.config.directed
    }

    /// Whether non-neighbour destinations are delivered anyway.
    #[inline]
    pub fn routing(&self) -> bool {
        self.config.routing
    }

    pub fn set_routing(&mut self, routing: bool) {
        self.config.routing = routing;
    }

    pub fn communication(&self) -> &CommunicationModel {
        &self.communication
    }

    pub fn set_communication(&mut self, communication: CommunicationModel) {
        self.communication = communication;
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    // ── Arena ─────────────────────────────────────────────

    /// Take ownership of `node` and place it.
    ///
    /// With no position the environment picks a free one. Fails if the
    /// node still belongs to another network or the position is not space.
    pub fn add_node(&mut self, mut node: Node, position: Option<Position>) -> SimResult<NodeId> {
        let id = node.id();
        if node.owner().is_some() || self.nodes.contains_key(&id) {
            return Err(SimError::NodeInAnotherNetwork(id));
        }
        let position = match position {
            Some(p) if self.environment.is_space(p) => p,
            Some(p) => return Err(SimError::SpaceOccupied { x: p.x, y: p.y }),
            None => self
                .environment
                .find_random_pos(self.config.placement_tries, &mut self.rng)
                .ok_or(SimError::NoFreeSpace {
                    tries: self.config.placement_tries,
                })?,
        };
        let orientation = self.rng.gen::<f64>() * std::f64::consts::TAU;

        node.set_owner(Some(self.id));
        self.nodes.insert(id, node);
        self.positions.insert(id, position);
        self.orientations.insert(id, orientation);
        self.labels.insert(id, id.raw().to_string());
        self.adjacency.insert(id, BTreeSet::new());
        self.recalculate_edges(id);

        debug!(node = %id, x = position.x, y = position.y, "node added");
        self.observers.notify(SimEvent::NetworkChanged);
        Ok(id)
    }

    /// Create a node with the configured default range and place it.
    pub fn add_node_at(&mut self, position: Position) -> SimResult<NodeId> {
        let node = Node::with_comm_range(self.config.default_comm_range);
        self.add_node(node, Some(position))
    }

    /// Release a node. Its edges and any traffic on them are discarded.
    pub fn remove_node(&mut self, id: NodeId) -> SimResult<Node> {
        let mut node = self.nodes.remove(&id).ok_or(SimError::NodeNotInNetwork(id))?;
        self.positions.remove(&id);
        self.orientations.remove(&id);
        self.labels.remove(&id);
        self.adjacency.remove(&id);
        for neighbours in self.adjacency.values_mut() {
            neighbours.remove(&id);
        }
        self.transit.retain(|(a, b), _| *a != id && *b != id);
        self.lost.retain(|(a, b), _| *a != id && *b != id);
        node.set_owner(None);

        debug!(node = %id, "node removed");
        self.observers.notify(SimEvent::NetworkChanged);
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> SimResult<&Node> {
        self.nodes.get(&id).ok_or(SimError::NodeNotInNetwork(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> SimResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(SimError::NodeNotInNetwork(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Placement side tables ─────────────────────────────

    pub fn position(&self, id: NodeId) -> SimResult<Position> {
        self.positions.get(&id).copied().ok_or(SimError::NodeNotInNetwork(id))
    }

    /// Move a node and rebuild its edges.
    pub fn set_position(&mut self, id: NodeId, position: Position) -> SimResult<()> {
        if !self.contains(id) {
            return Err(SimError::NodeNotInNetwork(id));
        }
        if !self.environment.is_space(position) {
            return Err(SimError::SpaceOccupied {
                x: position.x,
                y: position.y,
            });
        }
        self.positions.insert(id, position);
        self.recalculate_edges(id);
        self.observers.notify(SimEvent::NetworkChanged);
        Ok(())
    }

    /// Orientation in radians, within `[0, 2π)`.
    pub fn orientation(&self, id: NodeId) -> SimResult<f64> {
        self.orientations.get(&id).copied().ok_or(SimError::NodeNotInNetwork(id))
    }

    pub fn set_orientation(&mut self, id: NodeId, radians: f64) -> SimResult<()> {
        let slot = self.orientations.get_mut(&id).ok_or(SimError::NodeNotInNetwork(id))?;
        *slot = radians.rem_euclid(std::f64::consts::TAU);
        Ok(())
    }

    pub fn label(&self, id: NodeId) -> SimResult<&str> {
        self.labels.get(&id).map(String::as_str).ok_or(SimError::NodeNotInNetwork(id))
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> SimResult<()> {
        let slot = self.labels.get_mut(&id).ok_or(SimError::NodeNotInNetwork(id))?;
        *slot = label.into();
        Ok(())
    }

    /// Change a node's range and rebuild its edges.
    pub fn set_comm_range(&mut self, id: NodeId, comm_range: f64) -> SimResult<()> {
        self.node_mut(id)?.set_comm_range(comm_range);
        self.recalculate_edges(id);
        self.observers.notify(SimEvent::NetworkChanged);
        Ok(())
    }

    fn endpoint(&self, id: NodeId) -> Option<Endpoint> {
        Some(Endpoint {
            position: *self.positions.get(&id)?,
            comm_range: self.nodes.get(&id)?.comm_range(),
        })
    }

    /// Re-evaluate every candidate edge touching `id`.
    fn recalculate_edges(&mut self, id: NodeId) {
        for neighbours in self.adjacency.values_mut() {
            neighbours.remove(&id);
        }
        let Some(me) = self.endpoint(id) else {
            return;
        };
        let mut outgoing = BTreeSet::new();
        let mut incoming = BTreeSet::new();
        let others: Vec<(NodeId, Endpoint)> = self
            .nodes
            .keys()
            .filter(|other| **other != id)
            .filter_map(|other| Some((*other, self.endpoint(*other)?)))
            .collect();

        for (other, them) in others {
            let env = self.environment.as_ref();
            if self.config.directed {
                if self.range.in_range(me, them, env, &mut self.rng) {
                    outgoing.insert(other);
                }
                if self.range.in_range(them, me, env, &mut self.rng) {
                    incoming.insert(other);
                }
            } else if self.range.in_range(me, them, env, &mut self.rng) {
                outgoing.insert(other);
                incoming.insert(other);
            }
        }
        for other in &incoming {
            self.adjacency.entry(*other).or_default().insert(id);
        }
        self.adjacency.insert(id, outgoing);
    }

    fn recalculate_all_edges(&mut self) {
        for neighbours in self.adjacency.values_mut() {
            neighbours.clear();
        }
        for id in self.node_ids() {
            self.recalculate_edges(id);
        }
    }

    // ── Node state helpers ────────────────────────────────

    /// Set a node's status tag and notify observers when it changes.
    pub fn set_status(&mut self, id: NodeId, status: Option<&'static str>) -> SimResult<()> {
        let previous = self.node_mut(id)?.set_status(status);
        if previous != status {
            self.observers.notify(SimEvent::NodeStatusChanged {
                node: id,
                previous,
                current: status,
            });
        }
        Ok(())
    }

    /// Queue a message in a node's outbox.
    pub fn push_to_outbox(
        &mut self,
        id: NodeId,
        message: Message,
        destination: Destination,
    ) -> SimResult<()> {
        let message_id = message.id();
        self.node_mut(id)?.push_to_outbox(message, destination);
        self.observers.notify(SimEvent::MessageSent {
            message: message_id,
            from: id,
        });
        Ok(())
    }

    /// Put a message straight into a node's inbox, bypassing transport.
    pub fn push_to_inbox(&mut self, id: NodeId, message: Message) -> SimResult<()> {
        self.node_mut(id)?.push_to_inbox(message);
        Ok(())
    }

    /// Advance every node's local clock by one.
    pub fn increment_node_clocks(&mut self) {
        for node in self.nodes.values_mut() {
            node.tick();
        }
    }

    /// True when some node has queued or unread messages, or something is
    /// still in transit.
    pub fn has_traffic(&self) -> bool {
        self.nodes.values().any(|n| !n.is_quiet()) || self.in_transit_count() > 0
    }

    // ── Observers ─────────────────────────────────────────

    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.add(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn notify(&mut self, event: SimEvent) {
        self.observers.notify(event);
    }

    // ── Algorithms ────────────────────────────────────────

    /// Bind algorithms in execution order. Every binding is validated and
    /// instantiated now, so parameter errors surface at bind time.
    pub fn set_algorithms(&mut self, bindings: Vec<AlgorithmBinding>) -> SimResult<()> {
        self.schedule = AlgorithmSchedule::bind(bindings)?;
        Ok(())
    }

    pub fn algorithm_count(&self) -> usize {
        self.schedule.len()
    }

    /// Cursor over the bound algorithms.
    pub fn algorithm_state(&self) -> AlgorithmState {
        self.schedule.state()
    }

    /// Index of the algorithm that should run next, advancing past a
    /// finished one. `None` once every algorithm has finished.
    pub fn current_algorithm(&mut self) -> SimResult<Option<usize>> {
        self.schedule.current()
    }

    /// Mark the algorithm under the cursor as finished.
    pub fn finish_current_algorithm(&mut self) {
        self.schedule.finish();
    }

    /// Borrow a bound algorithm by index.
    pub fn algorithm(&self, index: usize) -> SimResult<&dyn Algorithm> {
        self.schedule.get(index)
    }

    /// Downcast a bound algorithm to its concrete type.
    pub fn algorithm_as<T: Algorithm + 'static>(&self, index: usize) -> Option<&T> {
        self.schedule.get(index).ok()?.as_any().downcast_ref::<T>()
    }

    /// Downcast a bound algorithm mutably.
    pub fn algorithm_as_mut<T: Algorithm + 'static>(&mut self, index: usize) -> Option<&mut T> {
        self.schedule.get_mut(index).ok()?.as_any_mut().downcast_mut::<T>()
    }

    /// Run one step of the algorithm at `index` against this network.
    pub fn step_algorithm(&mut self, index: usize, check_restrictions: bool) -> SimResult<()> {
        let mut algorithm = self.schedule.take(index)?;
        let result = algorithm.step(self, check_restrictions);
        self.schedule.restore(index, algorithm);
        if result.is_ok() {
            self.schedule.record_step();
        }
        result
    }

    pub fn is_algorithm_halted(&self, index: usize) -> SimResult<bool> {
        Ok(self.schedule.get(index)?.is_halted(self))
    }

    /// Return to the state right after binding: transport pools emptied,
    /// nodes reset, algorithms rebuilt from their bindings, cursor rewound,
    /// random stream reseeded.
    pub fn reset(&mut self) -> SimResult<()> {
        self.transit.clear();
        self.lost.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        for node in self.nodes.values_mut() {
            node.reset();
        }
        self.schedule.reset()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}
