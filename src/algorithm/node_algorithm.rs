//! Distributed algorithms: every node runs the same status machine and
//! reacts to one message per step.

use std::any::Any;

use tracing::{debug, error, info, warn};

use crate::error::{SimError, SimResult};
use crate::message::{Destination, Message};
use crate::network::Network;
use crate::node::NodeId;
use crate::observer::SimEvent;
use crate::restriction::{check_restrictions, Restriction, AXIOMS};

use super::alarm::{AlarmBook, AlarmId};
use super::context::{InitContext, NodeContext};
use super::dispatch::DispatchTable;
use super::params::{ParamSpec, Params};
use super::status::{Action, StatusValue};
use super::Algorithm;

// ── NodeAlgorithm ─────────────────────────────────────────────────────

/// A status machine executed by every node of the network.
///
/// Handlers are plain functions registered in a [`DispatchTable`] built
/// once per runner. The algorithm value itself holds the resolved
/// parameters and any state shared by all nodes.
///
/// # Example
///
/// ```rust
/// use distsim::algorithm::{Action, DispatchTable, NodeAlgorithm, NodeContext, Params};
/// use distsim::error::SimResult;
/// use distsim::message::Message;
///
/// distsim::status_values! {
///     pub enum Phase {
///         Idle => "IDLE",
///         Done => "DONE",
///     }
/// }
///
/// #[derive(Debug)]
/// struct Wake;
///
/// impl Wake {
///     fn wake(&mut self, ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
///         ctx.set_status(Phase::Done)
///     }
/// }
///
/// impl NodeAlgorithm for Wake {
///     type Status = Phase;
///     const NAME: &'static str = "Wake";
///
///     fn from_params(_params: &Params) -> SimResult<Self> {
///         Ok(Wake)
///     }
///     fn handlers() -> DispatchTable<Self> {
///         DispatchTable::new().on(Phase::Idle, Action::Spontaneously, Wake::wake)
///     }
///     fn idle_status() -> Phase {
///         Phase::Idle
///     }
/// }
/// ```
pub trait NodeAlgorithm: Sized + std::fmt::Debug + 'static {
    type Status: StatusValue;

    const NAME: &'static str;

    /// Parameters this algorithm requires or defaults.
    fn param_spec() -> SimResult<ParamSpec> {
        Ok(ParamSpec::new())
    }

    /// Build the algorithm from parameters already resolved against
    /// [`param_spec`](NodeAlgorithm::param_spec).
    fn from_params(params: &Params) -> SimResult<Self>;

    fn handlers() -> DispatchTable<Self>;

    /// Status the default initializer gives every node.
    fn idle_status() -> Self::Status;

    /// Preconditions on top of the axioms.
    fn restrictions(&self) -> &'static [&'static dyn Restriction] {
        &[]
    }

    /// Called once, before the first step.
    fn initializer(&mut self, ctx: &mut InitContext<'_>) -> SimResult<()> {
        default_initializer(ctx, Self::idle_status())
    }

    /// Statuses a node may hold right after initialization.
    fn s_init() -> &'static [Self::Status] {
        &[]
    }

    /// Statuses a node may hold once the algorithm has finished.
    fn s_term() -> &'static [Self::Status] {
        &[]
    }
}

/// Apply restrictions, wake the lowest-id node and put every node in `idle`.
pub fn default_initializer<S: StatusValue>(ctx: &mut InitContext<'_>, idle: S) -> SimResult<()> {
    debug!(algorithm = ctx.algorithm(), "default initializer");
    ctx.apply_restrictions()?;
    if let Some(first) = ctx.lowest_node() {
        ctx.push_initialization(first)?;
    }
    ctx.set_all_statuses(idle)
}

// ── NodeAlgorithmRunner ───────────────────────────────────────────────

/// Drives a [`NodeAlgorithm`] over a network, one step at a time.
#[derive(Debug)]
pub struct NodeAlgorithmRunner<A: NodeAlgorithm> {
    algorithm: A,
    table: DispatchTable<A>,
    alarms: AlarmBook,
    steps: u64,
}

impl<A: NodeAlgorithm> NodeAlgorithmRunner<A> {
    pub fn new(algorithm: A) -> Self {
        NodeAlgorithmRunner {
            algorithm,
            table: A::handlers(),
            alarms: AlarmBook::new(),
            steps: 0,
        }
    }

    /// Resolve `params` against the algorithm's declaration and build it.
    pub fn from_params(params: &Params) -> SimResult<Self> {
        let resolved = A::param_spec()?.resolve(A::NAME, params)?;
        Ok(Self::new(A::from_params(&resolved)?))
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn algorithm_mut(&mut self) -> &mut A {
        &mut self.algorithm
    }

    pub fn alarms(&self) -> &AlarmBook {
        &self.alarms
    }

    // ── Alarms ────────────────────────────────────────────

    /// Schedule `message` for `node` after `ticks` steps.
    pub fn set_alarm(
        &mut self,
        network: &Network,
        node: NodeId,
        ticks: i64,
        message: Message,
    ) -> SimResult<AlarmId> {
        if !network.contains(node) {
            return Err(SimError::NodeNotInNetwork(node));
        }
        self.alarms.set(node, ticks, message)
    }

    pub fn disable_alarm(&mut self, network: &mut Network, id: AlarmId) -> bool {
        self.alarms.disable(network, id)
    }

    pub fn disable_all_node_alarms(&mut self, network: &mut Network, node: NodeId) -> usize {
        self.alarms.disable_all_for(network, node)
    }

    pub fn update_alarm_time(&mut self, network: &mut Network, id: AlarmId, diff: i64) -> bool {
        self.alarms.update_time(network, id, diff)
    }

    // ── Verification ──────────────────────────────────────

    /// Every node holds one of [`NodeAlgorithm::s_init`].
    pub fn check_algorithm_initialization(&self, network: &Network) -> SimResult<()> {
        Self::check_statuses(network, A::s_init())
    }

    /// Every node holds one of [`NodeAlgorithm::s_term`].
    pub fn check_algorithm_termination(&self, network: &Network) -> SimResult<()> {
        Self::check_statuses(network, A::s_term())
    }

    fn check_statuses(network: &Network, expected: &[A::Status]) -> SimResult<()> {
        for node in network.nodes() {
            let status = node.status();
            let known = status.and_then(A::Status::from_name);
            if !known.is_some_and(|s| expected.contains(&s)) {
                return Err(SimError::UnexpectedStatus {
                    node: node.id(),
                    algorithm: A::NAME.to_string(),
                    status: status.map(str::to_string),
                    expected: expected.iter().map(|s| s.name().to_string()).collect(),
                });
            }
        }
        Ok(())
    }

    /// The axioms followed by the algorithm's own restrictions.
    pub fn restriction_list(&self) -> Vec<&'static dyn Restriction> {
        AXIOMS
            .iter()
            .chain(self.algorithm.restrictions())
            .copied()
            .collect()
    }

    // ── Stepping ──────────────────────────────────────────

    fn initialize(&mut self, network: &mut Network, check: bool) -> SimResult<()> {
        network.notify(SimEvent::AlgorithmStarted {
            algorithm: A::NAME.to_string(),
        });
        info!(algorithm = A::NAME, nodes = network.len(), "algorithm started");

        let restrictions = self.restriction_list();
        let mut ctx = InitContext::new(network, &restrictions, A::NAME);
        self.algorithm.initializer(&mut ctx)?;

        if check {
            check_restrictions(network, &restrictions, A::NAME)?;
        }
        if !network.has_traffic() {
            warn!(algorithm = A::NAME, "initializer did not produce any message");
        }
        Ok(())
    }

    fn node_step(&mut self, network: &mut Network, id: NodeId) -> SimResult<()> {
        let node = network.node_mut(id)?;
        let Some(message) = node.receive() else {
            return Ok(());
        };
        if let Destination::Node(target) = &message.destination {
            if *target != id {
                debug!(node = %id, message = %message.id(), "message addressed elsewhere, skipped");
                return Ok(());
            }
        }

        let action = Action::for_message(message.meta_header);
        let Some(status) = node.status().and_then(A::Status::from_name) else {
            error!(
                algorithm = A::NAME,
                node = %id,
                status = ?node.status(),
                "node status is not a status of this algorithm, message dropped"
            );
            return Ok(());
        };
        let Some(handler) = self.table.resolve(status, action) else {
            error!(
                algorithm = A::NAME,
                node = %id,
                %action,
                status = status.name(),
                "no handler for action in this status, message dropped"
            );
            return Ok(());
        };

        debug!(node = %id, message = %message.id(), %action, status = status.name(), "dispatch");
        let mut ctx = NodeContext::new(network, &mut self.alarms, id);
        handler(&mut self.algorithm, &mut ctx, message)
    }
}

impl<A: NodeAlgorithm> Algorithm for NodeAlgorithmRunner<A> {
    fn name(&self) -> &'static str {
        A::NAME
    }

    fn step(&mut self, network: &mut Network, check: bool) -> SimResult<()> {
        if self.steps == 0 {
            self.initialize(network, check)?;
        } else {
            network.communicate()?;
            network.increment_node_clocks();
            self.alarms.process(network);
            for id in network.node_ids() {
                self.node_step(network, id)?;
            }
        }

        self.steps += 1;
        debug!(algorithm = A::NAME, step = self.steps, "step done");
        network.notify(SimEvent::StepDone {
            algorithm: A::NAME.to_string(),
            step: self.steps,
        });
        Ok(())
    }

    /// Halted before the first step, and afterwards once no node has
    /// anything to read or send, nothing is in transit and no alarm is
    /// pending.
    fn is_halted(&self, network: &Network) -> bool {
        self.steps == 0 || (!network.has_traffic() && self.alarms.is_empty())
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CommunicationModel, CompleteRange, NetworkConfig, Position};
    use crate::observer::{EventRecorder, SimEvent};
    use serde_json::{json, Value};

    crate::status_values! {
        enum Phase {
            Idle => "IDLE",
            Done => "DONE",
        }
    }

    /// Node 0 tells every neighbour to finish.
    #[derive(Debug, Default)]
    struct Shout {
        heard: u32,
    }

    impl Shout {
        fn start(&mut self, ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
            ctx.send(Message::new("shout", json!("hi")))?;
            ctx.set_status(Phase::Done)
        }

        fn hear(&mut self, ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
            self.heard += 1;
            ctx.notify("shout_heard");
            ctx.set_status(Phase::Done)
        }
    }

    impl NodeAlgorithm for Shout {
        type Status = Phase;
        const NAME: &'static str = "Shout";

        fn from_params(_params: &Params) -> SimResult<Self> {
            Ok(Shout::default())
        }

        fn handlers() -> DispatchTable<Self> {
            DispatchTable::new()
                .on(Phase::Idle, Action::Spontaneously, Shout::start)
                .on(Phase::Idle, Action::Receiving, Shout::hear)
        }

        fn idle_status() -> Phase {
            Phase::Idle
        }

        fn s_init() -> &'static [Phase] {
            &[Phase::Idle]
        }

        fn s_term() -> &'static [Phase] {
            &[Phase::Done]
        }
    }

    /// Never registers a handler.
    #[derive(Debug)]
    struct Mute;

    impl NodeAlgorithm for Mute {
        type Status = Phase;
        const NAME: &'static str = "Mute";

        fn from_params(_params: &Params) -> SimResult<Self> {
            Ok(Mute)
        }

        fn handlers() -> DispatchTable<Self> {
            DispatchTable::new()
        }

        fn idle_status() -> Phase {
            Phase::Idle
        }
    }

    fn network(n: usize) -> Network {
        let mut net = Network::new(NetworkConfig::default())
            .with_range(CompleteRange)
            .with_communication(CommunicationModel::ideal());
        for i in 0..n {
            net.add_node_at(Position::new(10.0 * i as f64, 10.0)).unwrap();
        }
        net
    }

    #[test]
    fn test_fresh_runner_is_halted() {
        let net = network(3);
        let runner = NodeAlgorithmRunner::new(Shout::default());
        assert!(runner.is_halted(&net));
        assert_eq!(runner.steps(), 0);
    }

    #[test]
    fn test_initialization_then_latency() {
        let mut net = network(3);
        let first = net.node_ids()[0];
        let mut runner = NodeAlgorithmRunner::new(Shout::default());

        runner.step(&mut net, true).unwrap();
        assert!(!runner.is_halted(&net), "INI is waiting in the first inbox");
        assert_eq!(net.node(first).unwrap().inbox().count(), 1);
        runner.check_algorithm_initialization(&net).unwrap();

        runner.step(&mut net, true).unwrap();
        assert_eq!(
            net.node(first).unwrap().inbox().count(),
            1,
            "one step of inbox latency"
        );

        runner.step(&mut net, true).unwrap();
        assert_eq!(net.node(first).unwrap().status(), Some("DONE"));
        assert_eq!(net.node(first).unwrap().outbox().count(), 1);
    }

    #[test]
    fn test_runs_to_termination() {
        let mut net = network(4);
        let mut runner = NodeAlgorithmRunner::new(Shout::default());
        for _ in 0..20 {
            runner.step(&mut net, true).unwrap();
            if runner.is_halted(&net) {
                break;
            }
        }
        assert!(runner.is_halted(&net));
        runner.check_algorithm_termination(&net).unwrap();
        assert_eq!(runner.algorithm().heard, 3);
    }

    #[test]
    fn test_termination_check_names_node() {
        let mut net = network(2);
        let mut runner = NodeAlgorithmRunner::new(Shout::default());
        runner.step(&mut net, false).unwrap();
        let err = runner.check_algorithm_termination(&net).unwrap_err();
        assert!(matches!(err, SimError::UnexpectedStatus { ref status, .. } if status.as_deref() == Some("IDLE")));
    }

    #[test]
    fn test_alarm_delivered_on_third_step() {
        let mut net = network(1);
        let node = net.node_ids()[0];
        let mut runner = NodeAlgorithmRunner::new(Mute);
        runner.step(&mut net, false).unwrap();
        net.node_mut(node).unwrap().receive();
        net.node_mut(node).unwrap().receive();

        runner.set_alarm(&net, node, 3, Message::new("wake", Value::Null)).unwrap();
        runner.step(&mut net, false).unwrap();
        runner.step(&mut net, false).unwrap();
        assert!(
            !net.node(node).unwrap().inbox().any(|m| m.header == "wake"),
            "not before the third step"
        );
        runner.step(&mut net, false).unwrap();
        assert!(net.node(node).unwrap().inbox().any(|m| m.header == "wake"));
    }

    #[test]
    fn test_disabled_alarm_never_delivered() {
        let mut net = network(1);
        let node = net.node_ids()[0];
        let mut runner = NodeAlgorithmRunner::new(Mute);
        runner.step(&mut net, false).unwrap();

        let id = runner.set_alarm(&net, node, 3, Message::new("wake", Value::Null)).unwrap();
        runner.step(&mut net, false).unwrap();
        runner.step(&mut net, false).unwrap();
        assert!(runner.disable_alarm(&mut net, id));
        for _ in 0..3 {
            runner.step(&mut net, false).unwrap();
            assert!(!net.node(node).unwrap().inbox().any(|m| m.header == "wake"));
        }
    }

    #[test]
    fn test_set_alarm_rejects_foreign_node() {
        let net = network(1);
        let mut runner = NodeAlgorithmRunner::new(Mute);
        let stranger = NodeId::new(u64::MAX);
        assert_eq!(
            runner.set_alarm(&net, stranger, 1, Message::new("x", Value::Null)),
            Err(SimError::NodeNotInNetwork(stranger))
        );
    }

    #[test]
    fn test_missing_handler_drops_message() {
        let mut net = network(2);
        let mut runner = NodeAlgorithmRunner::new(Mute);
        for _ in 0..3 {
            runner.step(&mut net, false).unwrap();
        }
        assert!(runner.is_halted(&net), "the INI message was consumed and dropped");
        assert!(net.nodes().all(|n| n.status() == Some("IDLE")));
    }

    #[test]
    fn test_events_emitted() {
        let mut net = network(2);
        let recorder = EventRecorder::new();
        net.add_observer(Box::new(recorder.clone()));
        let mut runner = NodeAlgorithmRunner::new(Shout::default());
        runner.step(&mut net, true).unwrap();
        runner.step(&mut net, true).unwrap();

        assert_eq!(recorder.count("algorithm_started"), 1);
        assert_eq!(recorder.count("step_done"), 2);
        assert_eq!(recorder.count("node_status_changed"), 2, "IDLE assigned to both nodes");
    }

    #[test]
    fn test_handlers_raise_custom_events() {
        let mut net = network(3);
        let ids = net.node_ids();
        let recorder = EventRecorder::new();
        net.add_observer(Box::new(recorder.clone()));
        let mut runner = NodeAlgorithmRunner::new(Shout::default());
        for _ in 0..10 {
            runner.step(&mut net, true).unwrap();
        }

        assert_eq!(recorder.count("shout_heard"), 2);
        let raisers: Vec<NodeId> = recorder
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SimEvent::Custom { node, .. } => Some(node),
                _ => None,
            })
            .collect();
        assert_eq!(raisers, ids[1..].to_vec());
    }

    #[test]
    fn test_restriction_list_starts_with_axioms() {
        let runner = NodeAlgorithmRunner::new(Shout::default());
        let names: Vec<_> = runner.restriction_list().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["FiniteCommunicationDelays", "LocalOrientation"]);
    }
}
