//! Simulation driver.
//!
//! Steps the network's active algorithm until it halts, then moves the
//! cursor to the next bound algorithm. The loop is synchronous and
//! single-threaded; one call to `Network::step_algorithm` is one step.

use tracing::{debug, info};

use crate::error::SimResult;
use crate::network::Network;
use crate::observer::{Observer, SimEvent};

// ── Configuration ─────────────────────────────────────────────────────

/// Driver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Verify each algorithm's restrictions right after its initializer.
    pub check_restrictions: bool,
}

impl SimulationConfig {
    pub fn new() -> Self {
        SimulationConfig {
            check_restrictions: true,
        }
    }

    /// Builder: skip restriction checks.
    pub fn unchecked() -> Self {
        SimulationConfig {
            check_restrictions: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Simulation ────────────────────────────────────────────────────────

/// Top-level driver. Owns the network it runs.
///
/// ```rust
/// use distsim::algorithm::AlgorithmBinding;
/// use distsim::builder::NetworkBuilder;
/// use distsim::protocols::Flood;
/// use distsim::simulation::Simulation;
///
/// let network = NetworkBuilder::new()
///     .line(5, 10.0)
///     .comm_range(15.0)
///     .algorithm(AlgorithmBinding::node::<Flood>().param("information_key", "greet"))
///     .memory(0, "greet", "hello")
///     .build()
///     .unwrap();
///
/// let mut sim = Simulation::new(network);
/// sim.run(0).unwrap();
/// assert!(sim.network().nodes().all(|n| n.memory.get("greet").is_some()));
/// ```
pub struct Simulation {
    network: Network,
    config: SimulationConfig,
    pending_observers: Vec<Box<dyn Observer>>,
}

impl Simulation {
    pub fn new(network: Network) -> Self {
        Simulation {
            network,
            config: SimulationConfig::default(),
            pending_observers: Vec::new(),
        }
    }

    /// Builder: replace the driver settings.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    /// Queue an observer. It is handed to the network on the next `run`.
    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.pending_observers.push(observer);
    }

    /// Run from the current state.
    ///
    /// With `budget == 0` every remaining algorithm runs to completion.
    /// Otherwise at most `budget` steps are taken and the call returns once
    /// the active algorithm finishes, even if budget remains. Returns the
    /// number of steps taken.
    pub fn run(&mut self, budget: u64) -> SimResult<u64> {
        self.register_observers();
        let mut taken = 0;
        loop {
            let Some(index) = self.network.current_algorithm()? else {
                info!("no algorithms left to run; reset the simulation to start over");
                break;
            };
            let remaining = if budget == 0 { 0 } else { budget - taken };
            taken += self.run_algorithm(index, remaining)?;
            if budget > 0 {
                break;
            }
        }
        Ok(taken)
    }

    /// Run a single step. Same as `run(1)`.
    pub fn run_step(&mut self) -> SimResult<u64> {
        self.run(1)
    }

    /// Step algorithm `index` until it halts or `budget` steps (0 for no
    /// limit) have been taken. The halted check follows every step.
    fn run_algorithm(&mut self, index: usize, budget: u64) -> SimResult<u64> {
        let mut taken = 0;
        loop {
            self.network.step_algorithm(index, self.config.check_restrictions)?;
            taken += 1;

            if self.network.is_algorithm_halted(index)? {
                let name = self.network.algorithm(index)?.name();
                info!(algorithm = name, steps = taken, "algorithm finished");
                self.network.notify(SimEvent::AlgorithmFinished {
                    algorithm: name.to_string(),
                });
                self.network.finish_current_algorithm();
                return Ok(taken);
            }
            if budget > 0 && taken >= budget {
                debug!(steps = taken, "step budget exhausted");
                return Ok(taken);
            }
        }
    }

    fn register_observers(&mut self) {
        for observer in self.pending_observers.drain(..) {
            self.network.add_observer(observer);
        }
    }

    /// True when no algorithm is active or the active one is halted.
    pub fn is_halted(&self) -> bool {
        let state = self.network.algorithm_state();
        self.network
            .algorithm(state.index)
            .map_or(true, |algorithm| state.finished || algorithm.is_halted(&self.network))
    }

    /// Rewind the network and its algorithms to the state right after
    /// binding.
    pub fn reset(&mut self) -> SimResult<()> {
        info!("resetting simulation");
        self.network.reset()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Swap in another network and return the previous one.
    pub fn set_network(&mut self, network: Network) -> Network {
        let previous = std::mem::replace(&mut self.network, network);
        self.register_observers();
        self.network.notify(SimEvent::NetworkChanged);
        debug!(network = %self.network.id(), "network loaded");
        previous
    }

    pub fn into_network(self) -> Network {
        self.network
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("network", &self.network.id())
            .field("config", &self.config)
            .field("pending_observers", &self.pending_observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{
        Action, AlgorithmBinding, DispatchTable, NetworkAlgorithm, NodeAlgorithm, NodeContext,
        Params,
    };
    use crate::error::{SimError, SimResult};
    use crate::message::Message;
    use crate::network::{CommunicationModel, CompleteRange, NetworkConfig, Position};
    use crate::observer::EventRecorder;
    use serde_json::{json, Value};

    crate::status_values! {
        enum Phase {
            Idle => "IDLE",
            Done => "DONE",
        }
    }

    /// The lowest node pings its neighbours once.
    #[derive(Debug)]
    struct Ping;

    impl Ping {
        fn start(&mut self, ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
            ctx.send(Message::new("ping", Value::Null))?;
            ctx.set_status(Phase::Done)
        }

        fn pong(&mut self, ctx: &mut NodeContext<'_>, _msg: Message) -> SimResult<()> {
            ctx.set_status(Phase::Done)
        }
    }

    impl NodeAlgorithm for Ping {
        type Status = Phase;
        const NAME: &'static str = "Ping";

        fn from_params(_params: &Params) -> SimResult<Self> {
            Ok(Ping)
        }

        fn handlers() -> DispatchTable<Self> {
            DispatchTable::new()
                .on(Phase::Idle, Action::Spontaneously, Ping::start)
                .on(Phase::Idle, Action::Receiving, Ping::pong)
        }

        fn idle_status() -> Phase {
            Phase::Idle
        }
    }

    /// Stamps every node's memory.
    #[derive(Debug)]
    struct Stamp;

    impl NetworkAlgorithm for Stamp {
        const NAME: &'static str = "Stamp";

        fn from_params(_params: &Params) -> SimResult<Self> {
            Ok(Stamp)
        }

        fn run(&mut self, network: &mut Network) -> SimResult<()> {
            for node in network.nodes_mut() {
                node.memory.insert("stamped".into(), json!(true));
            }
            Ok(())
        }
    }

    fn network(bindings: Vec<AlgorithmBinding>) -> Network {
        let mut net = Network::new(NetworkConfig::default())
            .with_range(CompleteRange)
            .with_communication(CommunicationModel::ideal());
        for i in 0..3 {
            net.add_node_at(Position::new(i as f64 * 10.0, 0.0)).unwrap();
        }
        net.set_algorithms(bindings).unwrap();
        net
    }

    #[test]
    fn test_run_to_completion() {
        let net = network(vec![
            AlgorithmBinding::node::<Ping>(),
            AlgorithmBinding::centralized::<Stamp>(),
        ]);
        let mut sim = Simulation::new(net);
        let recorder = EventRecorder::new();
        sim.add_observer(Box::new(recorder.clone()));

        assert_eq!(sim.run(0).unwrap(), 6, "five steps of Ping, one of Stamp");
        assert!(sim.is_halted());
        assert!(sim.network().nodes().all(|n| n.status() == Some("DONE")));
        assert!(sim.network().nodes().all(|n| n.memory.contains_key("stamped")));
        assert_eq!(recorder.count("algorithm_started"), 2);
        assert_eq!(recorder.count("algorithm_finished"), 2);
        assert_eq!(recorder.count("step_done"), 6);

        assert_eq!(sim.run(0).unwrap(), 0, "nothing left to run");
    }

    #[test]
    fn test_budget_stops_mid_algorithm() {
        let net = network(vec![
            AlgorithmBinding::node::<Ping>(),
            AlgorithmBinding::centralized::<Stamp>(),
        ]);
        let mut sim = Simulation::new(net);

        assert_eq!(sim.run(3).unwrap(), 3);
        let state = sim.network().algorithm_state();
        assert_eq!((state.index, state.step, state.finished), (0, 3, false));
        assert!(!sim.is_halted());

        assert_eq!(sim.run(10).unwrap(), 2, "returns once Ping finishes");
        assert!(sim.network().algorithm_state().finished);
        assert!(sim.network().nodes().all(|n| !n.memory.contains_key("stamped")));

        assert_eq!(sim.run_step().unwrap(), 1);
        let state = sim.network().algorithm_state();
        assert_eq!((state.index, state.step, state.finished), (1, 1, true));
    }

    #[test]
    fn test_reset_reruns_from_scratch() {
        let net = network(vec![AlgorithmBinding::node::<Ping>()]);
        let mut sim = Simulation::new(net);
        sim.run(0).unwrap();
        sim.reset().unwrap();

        assert!(sim.network().nodes().all(|n| n.status().is_none()));
        assert_eq!(sim.network().algorithm_state(), Default::default());
        assert_eq!(sim.run(0).unwrap(), 5);
    }

    #[test]
    fn test_no_algorithm_bound() {
        let mut sim = Simulation::new(Network::default());
        assert_eq!(sim.run(0), Err(SimError::AlgorithmNotFound));
        assert!(sim.is_halted());
    }

    #[test]
    fn test_set_network_notifies() {
        let mut sim = Simulation::new(network(vec![AlgorithmBinding::node::<Ping>()]));
        let recorder = EventRecorder::new();
        sim.add_observer(Box::new(recorder.clone()));

        let previous = sim.set_network(network(vec![AlgorithmBinding::node::<Ping>()]));
        assert_eq!(previous.len(), 3);
        assert_eq!(recorder.count("network_changed"), 1);
        assert_eq!(sim.network().observer_count(), 1);
    }

    #[test]
    fn test_restriction_failure_surfaces() {
        use crate::restriction::{Restriction, TreeGraph};

        #[derive(Debug)]
        struct NeedsTree;

        impl NodeAlgorithm for NeedsTree {
            type Status = Phase;
            const NAME: &'static str = "NeedsTree";

            fn from_params(_params: &Params) -> SimResult<Self> {
                Ok(NeedsTree)
            }
            fn handlers() -> DispatchTable<Self> {
                DispatchTable::new()
            }
            fn idle_status() -> Phase {
                Phase::Idle
            }
            fn restrictions(&self) -> &'static [&'static dyn Restriction] {
                const REQUIRED: &[&dyn Restriction] = &[&TreeGraph];
                REQUIRED
            }
        }

        let net = network(vec![AlgorithmBinding::node::<NeedsTree>()]);
        let mut sim = Simulation::new(net);
        assert_eq!(
            sim.run(0),
            Err(SimError::RestrictionViolated {
                restriction: "TreeGraph".into(),
                algorithm: "NeedsTree".into(),
            })
        );

        let net = network(vec![AlgorithmBinding::node::<NeedsTree>()]);
        let mut sim = Simulation::new(net).with_config(SimulationConfig::unchecked());
        assert!(sim.run(0).is_ok());
    }
}
