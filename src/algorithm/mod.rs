//! Algorithms and how they are bound to a network.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`status`] | [`StatusValue`], [`status_values!`](crate::status_values), [`Action`] |
//! | [`params`] | [`Params`], [`ParamSpec`] |
//! | [`dispatch`] | [`DispatchTable`] from `(status, action)` to handler |
//! | [`context`] | [`NodeContext`], [`InitContext`] |
//! | [`alarm`] | [`AlarmBook`] |
//! | [`node_algorithm`] | [`NodeAlgorithm`], [`NodeAlgorithmRunner`] |
//! | [`centralized`] | [`NetworkAlgorithm`], [`CentralizedRunner`] |
//!
//! A network holds an ordered list of [`AlgorithmBinding`]s. Binding
//! resolves parameters and builds each algorithm right away, so a missing
//! parameter is reported by `Network::set_algorithms`, not mid-run.

pub mod alarm;
pub mod centralized;
pub mod context;
pub mod dispatch;
pub mod node_algorithm;
pub mod params;
pub mod status;

use std::any::Any;

use crate::error::{SimError, SimResult};
use crate::network::Network;

pub use alarm::{Alarm, AlarmBook, AlarmId};
pub use centralized::{CentralizedRunner, NetworkAlgorithm};
pub use context::{InitContext, NodeContext};
pub use dispatch::{DispatchTable, Handler};
pub use node_algorithm::{default_initializer, NodeAlgorithm, NodeAlgorithmRunner};
pub use params::{ParamSpec, Params};
pub use status::{Action, StatusValue};

// ── Algorithm ─────────────────────────────────────────────────────────

/// A type-erased algorithm the simulation can step.
pub trait Algorithm: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Execute one step against `network`. With `check_restrictions` set,
    /// the algorithm's preconditions are verified after initialization.
    fn step(&mut self, network: &mut Network, check_restrictions: bool) -> SimResult<()>;

    fn is_halted(&self, network: &Network) -> bool;

    /// Steps taken so far.
    fn steps(&self) -> u64;

    /// Downcast support for [`Network::algorithm_as`].
    fn as_any(&self) -> &dyn Any;
    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ── AlgorithmState ────────────────────────────────────────────────────

/// Cursor over a network's bound algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmState {
    /// Index of the active algorithm.
    pub index: usize,
    /// Steps the active algorithm has taken.
    pub step: u64,
    pub finished: bool,
}

// ── AlgorithmBinding ──────────────────────────────────────────────────

type SpecFn = fn() -> SimResult<ParamSpec>;
type BuildFn = fn(&Params) -> SimResult<Box<dyn Algorithm>>;

/// An algorithm type plus the parameter values it was bound with.
///
/// ```rust
/// use distsim::algorithm::AlgorithmBinding;
/// use distsim::protocols::Flood;
///
/// let binding = AlgorithmBinding::node::<Flood>().param("information_key", "greet");
/// assert_eq!(binding.name(), "Flood");
/// assert!(binding.instantiate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct AlgorithmBinding {
    name: &'static str,
    params: Params,
    spec: SpecFn,
    build: BuildFn,
}

impl AlgorithmBinding {
    /// Bind a distributed algorithm.
    pub fn node<A: NodeAlgorithm>() -> Self {
        AlgorithmBinding {
            name: A::NAME,
            params: Params::new(),
            spec: A::param_spec,
            build: build_node::<A>,
        }
    }

    /// Bind a centralized algorithm.
    pub fn centralized<A: NetworkAlgorithm>() -> Self {
        AlgorithmBinding {
            name: A::NAME,
            params: Params::new(),
            spec: A::param_spec,
            build: build_centralized::<A>,
        }
    }

    /// Builder: supply a parameter value.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Values as supplied, before defaults are filled in.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Resolve parameters and build a fresh algorithm instance.
    pub fn instantiate(&self) -> SimResult<Box<dyn Algorithm>> {
        let resolved = (self.spec)()?.resolve(self.name, &self.params)?;
        (self.build)(&resolved)
    }
}

fn build_node<A: NodeAlgorithm>(params: &Params) -> SimResult<Box<dyn Algorithm>> {
    Ok(Box::new(NodeAlgorithmRunner::new(A::from_params(params)?)))
}

fn build_centralized<A: NetworkAlgorithm>(params: &Params) -> SimResult<Box<dyn Algorithm>> {
    Ok(Box::new(CentralizedRunner::new(A::from_params(params)?)))
}

// ── AlgorithmSchedule ─────────────────────────────────────────────────

/// Bound algorithms, their live instances and the cursor.
///
/// A slot is empty only while its algorithm is being stepped.
#[derive(Debug, Default)]
pub(crate) struct AlgorithmSchedule {
    bindings: Vec<AlgorithmBinding>,
    slots: Vec<Option<Box<dyn Algorithm>>>,
    state: AlgorithmState,
}

impl AlgorithmSchedule {
    pub(crate) fn bind(bindings: Vec<AlgorithmBinding>) -> SimResult<Self> {
        let slots = Self::instantiate_all(&bindings)?;
        Ok(AlgorithmSchedule {
            bindings,
            slots,
            state: AlgorithmState::default(),
        })
    }

    fn instantiate_all(bindings: &[AlgorithmBinding]) -> SimResult<Vec<Option<Box<dyn Algorithm>>>> {
        bindings
            .iter()
            .map(|binding| binding.instantiate().map(Some))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn state(&self) -> AlgorithmState {
        self.state
    }

    /// Index of the active algorithm. A finished algorithm is replaced by
    /// the next one; `None` when the last one has finished.
    pub(crate) fn current(&mut self) -> SimResult<Option<usize>> {
        if self.slots.is_empty() {
            return Err(SimError::AlgorithmNotFound);
        }
        if self.state.finished {
            if self.state.index + 1 >= self.slots.len() {
                return Ok(None);
            }
            self.state = AlgorithmState {
                index: self.state.index + 1,
                step: 0,
                finished: false,
            };
        }
        Ok(Some(self.state.index))
    }

    pub(crate) fn finish(&mut self) {
        self.state.finished = true;
    }

    pub(crate) fn record_step(&mut self) {
        self.state.step += 1;
    }

    pub(crate) fn take(&mut self, index: usize) -> SimResult<Box<dyn Algorithm>> {
        self.slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(SimError::AlgorithmNotFound)
    }

    pub(crate) fn restore(&mut self, index: usize, algorithm: Box<dyn Algorithm>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(algorithm);
        }
    }

    pub(crate) fn get(&self, index: usize) -> SimResult<&dyn Algorithm> {
        match self.slots.get(index) {
            Some(Some(algorithm)) => Ok(&**algorithm),
            _ => Err(SimError::AlgorithmNotFound),
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> SimResult<&mut (dyn Algorithm + 'static)> {
        match self.slots.get_mut(index) {
            Some(Some(algorithm)) => Ok(&mut **algorithm),
            _ => Err(SimError::AlgorithmNotFound),
        }
    }

    /// Rebuild every instance from its binding and rewind the cursor.
    pub(crate) fn reset(&mut self) -> SimResult<()> {
        self.slots = Self::instantiate_all(&self.bindings)?;
        self.state = AlgorithmState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CompleteRange, NetworkConfig, Position};

    crate::status_values! {
        enum Phase {
            Idle => "IDLE",
        }
    }

    #[derive(Debug)]
    struct Needy {
        rounds: u64,
    }

    impl NodeAlgorithm for Needy {
        type Status = Phase;
        const NAME: &'static str = "Needy";

        fn param_spec() -> SimResult<ParamSpec> {
            Ok(ParamSpec::new().required("rounds"))
        }

        fn from_params(params: &Params) -> SimResult<Self> {
            Ok(Needy {
                rounds: params.get_as(Self::NAME, "rounds")?,
            })
        }

        fn handlers() -> DispatchTable<Self> {
            DispatchTable::new()
        }

        fn idle_status() -> Phase {
            Phase::Idle
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl NetworkAlgorithm for Broken {
        const NAME: &'static str = "Broken";

        fn param_spec() -> SimResult<ParamSpec> {
            ParamSpec::chain([
                ParamSpec::new().required("x"),
                ParamSpec::new().required("x"),
            ])
        }

        fn from_params(_params: &Params) -> SimResult<Self> {
            Ok(Broken)
        }
    }

    fn network() -> Network {
        let mut net = Network::new(NetworkConfig::default()).with_range(CompleteRange);
        net.add_node_at(Position::new(1.0, 1.0)).unwrap();
        net
    }

    #[test]
    fn test_missing_param_rejected_at_bind_time() {
        let mut net = network();
        let err = net
            .set_algorithms(vec![AlgorithmBinding::node::<Needy>()])
            .unwrap_err();
        assert_eq!(
            err,
            SimError::MissingParam { algorithm: "Needy".into(), param: "rounds".into() }
        );
        assert_eq!(net.algorithm_count(), 0);
    }

    #[test]
    fn test_inheritance_conflict_rejected_at_bind_time() {
        let mut net = network();
        let err = net
            .set_algorithms(vec![AlgorithmBinding::centralized::<Broken>()])
            .unwrap_err();
        assert_eq!(err, SimError::DuplicateRequiredParam { param: "x".into() });
    }

    #[test]
    fn test_bound_params_reach_algorithm() {
        let mut net = network();
        net.set_algorithms(vec![AlgorithmBinding::node::<Needy>().param("rounds", 7)])
            .unwrap();
        let runner = net.algorithm_as::<NodeAlgorithmRunner<Needy>>(0).unwrap();
        assert_eq!(runner.algorithm().rounds, 7);
    }

    #[test]
    fn test_cursor_advances_past_finished() {
        let mut net = network();
        assert_eq!(net.current_algorithm(), Err(SimError::AlgorithmNotFound));

        let needy = AlgorithmBinding::node::<Needy>().param("rounds", 1);
        net.set_algorithms(vec![needy.clone(), needy]).unwrap();
        assert_eq!(net.current_algorithm(), Ok(Some(0)));
        net.finish_current_algorithm();
        assert_eq!(net.current_algorithm(), Ok(Some(1)));
        assert_eq!(net.algorithm_state().step, 0);
        net.finish_current_algorithm();
        assert_eq!(net.current_algorithm(), Ok(None));

        net.reset().unwrap();
        assert_eq!(net.algorithm_state(), AlgorithmState::default());
        assert_eq!(net.current_algorithm(), Ok(Some(0)));
    }

    #[test]
    fn test_step_through_network_counts_steps() {
        let mut net = network();
        net.set_algorithms(vec![AlgorithmBinding::node::<Needy>().param("rounds", 1)])
            .unwrap();
        net.step_algorithm(0, true).unwrap();
        net.step_algorithm(0, true).unwrap();
        assert_eq!(net.algorithm_state().step, 2);
        assert_eq!(net.algorithm(0).unwrap().steps(), 2);
        assert_eq!(net.algorithm(0).unwrap().name(), "Needy");
    }
}
