//! Knowledge: facts nodes are assumed to know before the run starts.
//! Both restrictions here can be established by writing into node memory.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::SimResult;
use crate::network::Network;

use super::{Restriction, RestrictionCategory};

/// Every node holds a distinct value under [`InitialDistinctValues::KEY`].
/// Applying it stores each node's own id.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitialDistinctValues;

impl InitialDistinctValues {
    pub const KEY: &'static str = "unique_value";
}

impl Restriction for InitialDistinctValues {
    fn name(&self) -> &'static str {
        "InitialDistinctValues"
    }

    fn category(&self) -> RestrictionCategory {
        RestrictionCategory::Knowledge
    }

    fn check(&self, network: &Network) -> SimResult<bool> {
        let stored: BTreeSet<Option<u64>> = network
            .nodes()
            .map(|n| n.memory.get(Self::KEY).and_then(Value::as_u64))
            .collect();
        let ids: BTreeSet<Option<u64>> = network.nodes().map(|n| Some(n.id().raw())).collect();
        Ok(stored == ids)
    }

    fn is_applicable(&self) -> bool {
        true
    }

    fn apply(&self, network: &mut Network) -> SimResult<()> {
        for node in network.nodes_mut() {
            let id = node.id().raw();
            node.memory.insert(Self::KEY.to_string(), Value::from(id));
        }
        Ok(())
    }
}

/// Every node knows how many nodes there are.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkSize;

impl NetworkSize {
    pub const KEY: &'static str = "network_node_count";
}

impl Restriction for NetworkSize {
    fn name(&self) -> &'static str {
        "NetworkSize"
    }

    fn category(&self) -> RestrictionCategory {
        RestrictionCategory::Knowledge
    }

    fn check(&self, network: &Network) -> SimResult<bool> {
        let size = network.len() as u64;
        Ok(network
            .nodes()
            .all(|n| n.memory.get(Self::KEY).and_then(Value::as_u64) == Some(size)))
    }

    fn is_applicable(&self) -> bool {
        true
    }

    fn apply(&self, network: &mut Network) -> SimResult<()> {
        let size = network.len() as u64;
        for node in network.nodes_mut() {
            node.memory.insert(Self::KEY.to_string(), Value::from(size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{NetworkConfig, Position};

    fn three_nodes() -> Network {
        let mut net = Network::new(NetworkConfig::default());
        for i in 0..3 {
            net.add_node_at(Position::new(10.0 * (i + 1) as f64, 10.0)).unwrap();
        }
        net
    }

    #[test]
    fn test_distinct_values_after_apply() {
        let mut net = three_nodes();
        assert_eq!(InitialDistinctValues.check(&net), Ok(false));
        InitialDistinctValues.apply(&mut net).unwrap();
        assert_eq!(InitialDistinctValues.check(&net), Ok(true));
    }

    #[test]
    fn test_duplicate_values_fail() {
        let mut net = three_nodes();
        for node in net.nodes_mut() {
            node.memory.insert(InitialDistinctValues::KEY.into(), Value::from(7));
        }
        assert_eq!(InitialDistinctValues.check(&net), Ok(false));
    }

    #[test]
    fn test_network_size_after_apply() {
        let mut net = three_nodes();
        assert_eq!(NetworkSize.check(&net), Ok(false));
        NetworkSize.apply(&mut net).unwrap();
        assert_eq!(NetworkSize.check(&net), Ok(true));
        net.add_node_at(Position::new(90.0, 90.0)).unwrap();
        assert_eq!(NetworkSize.check(&net), Ok(false), "stale after growth");
    }
}
