//! Centralized algorithms: one `run` over the whole network, finished in a
//! single step.

use std::any::Any;

use tracing::info;

use crate::error::{SimError, SimResult};
use crate::network::Network;
use crate::observer::SimEvent;
use crate::restriction::{check_restrictions, Restriction, AXIOMS};

use super::params::{ParamSpec, Params};
use super::Algorithm;

/// An algorithm with global knowledge of the network.
pub trait NetworkAlgorithm: Sized + std::fmt::Debug + 'static {
    const NAME: &'static str;

    fn param_spec() -> SimResult<ParamSpec> {
        Ok(ParamSpec::new())
    }

    fn from_params(params: &Params) -> SimResult<Self>;

    fn restrictions(&self) -> &'static [&'static dyn Restriction] {
        &[]
    }

    /// The whole algorithm. Must be overridden.
    fn run(&mut self, _network: &mut Network) -> SimResult<()> {
        Err(SimError::NotImplemented {
            algorithm: Self::NAME.to_string(),
        })
    }
}

/// Adapts a [`NetworkAlgorithm`] to the step-driven [`Algorithm`] interface.
#[derive(Debug)]
pub struct CentralizedRunner<A: NetworkAlgorithm> {
    algorithm: A,
    steps: u64,
}

impl<A: NetworkAlgorithm> CentralizedRunner<A> {
    pub fn new(algorithm: A) -> Self {
        CentralizedRunner {
            algorithm,
            steps: 0,
        }
    }

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
}

impl<A: NetworkAlgorithm> Algorithm for CentralizedRunner<A> {
    fn name(&self) -> &'static str {
        A::NAME
    }

    fn step(&mut self, network: &mut Network, check: bool) -> SimResult<()> {
        if self.steps == 0 {
            network.notify(SimEvent::AlgorithmStarted {
                algorithm: A::NAME.to_string(),
            });
            info!(algorithm = A::NAME, "centralized algorithm started");
        }
        if check {
            let restrictions: Vec<&dyn Restriction> = AXIOMS
                .iter()
                .chain(self.algorithm.restrictions())
                .copied()
                .collect();
            check_restrictions(network, &restrictions, A::NAME)?;
        }
        self.algorithm.run(network)?;

        self.steps += 1;
        network.notify(SimEvent::StepDone {
            algorithm: A::NAME.to_string(),
            step: self.steps,
        });
        Ok(())
    }

    /// Halted once `run` has been executed.
    fn is_halted(&self, _network: &Network) -> bool {
        self.steps > 0
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
    use crate::network::{CompleteRange, NetworkConfig, Position};
    use serde_json::json;

    /// Labels every node with its degree.
    #[derive(Debug)]
    struct DegreeLabel {
        key: String,
    }

    impl NetworkAlgorithm for DegreeLabel {
        const NAME: &'static str = "DegreeLabel";

        fn param_spec() -> SimResult<ParamSpec> {
            Ok(ParamSpec::new().default_value("key", "degree"))
        }

        fn from_params(params: &Params) -> SimResult<Self> {
            Ok(DegreeLabel {
                key: params.get_as(Self::NAME, "key")?,
            })
        }

        fn run(&mut self, network: &mut Network) -> SimResult<()> {
            for id in network.node_ids() {
                let degree = network.degree(id);
                network.node_mut(id)?.memory.insert(self.key.clone(), json!(degree));
            }
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Lazy;

    impl NetworkAlgorithm for Lazy {
        const NAME: &'static str = "Lazy";

        fn from_params(_params: &Params) -> SimResult<Self> {
            Ok(Lazy)
        }
    }

    fn triangle() -> Network {
        let mut net = Network::new(NetworkConfig::default()).with_range(CompleteRange);
        for i in 0..3 {
            net.add_node_at(Position::new(i as f64 * 5.0, 5.0)).unwrap();
        }
        net
    }

    #[test]
    fn test_single_step_then_halted() {
        let mut net = triangle();
        let mut runner = CentralizedRunner::<DegreeLabel>::from_params(&Params::new()).unwrap();
        assert!(!runner.is_halted(&net));

        runner.step(&mut net, true).unwrap();
        assert!(runner.is_halted(&net));
        assert_eq!(runner.steps(), 1);
        for node in net.nodes() {
            assert_eq!(node.memory.get("degree"), Some(&json!(2)));
        }
    }

    #[test]
    fn test_missing_run_is_not_implemented() {
        let mut net = triangle();
        let mut runner = CentralizedRunner::new(Lazy);
        assert_eq!(
            runner.step(&mut net, false),
            Err(SimError::NotImplemented { algorithm: "Lazy".into() })
        );
        assert!(!runner.is_halted(&net));
    }
}
