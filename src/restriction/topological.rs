//! Restrictions on the shape of the communication graph.

use std::collections::BTreeSet;

use crate::error::SimResult;
use crate::network::Network;

use super::{holds_initialization, not_modeled, Restriction, RestrictionCategory};

macro_rules! topological {
    ($name:ident) => {
        fn name(&self) -> &'static str {
            stringify!($name)
        }

        fn category(&self) -> RestrictionCategory {
            RestrictionCategory::Topological
        }
    };
}

/// The graph is connected; strongly connected when directed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connectivity;

impl Restriction for Connectivity {
    topological!(Connectivity);

    fn check(&self, network: &Network) -> SimResult<bool> {
        Ok(network.is_connected())
    }
}

/// Exactly one node holds an initialization message.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueInitiator;

impl Restriction for UniqueInitiator {
    topological!(UniqueInitiator);

    fn check(&self, network: &Network) -> SimResult<bool> {
        Ok(network.nodes().filter(|n| holds_initialization(n)).count() == 1)
    }
}

/// Every node is linked to every other node and to nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteGraph;

impl Restriction for CompleteGraph {
    topological!(CompleteGraph);

    fn check(&self, network: &Network) -> SimResult<bool> {
        let others = network.len().saturating_sub(1);
        Ok(network.node_ids().into_iter().all(|id| {
            !network.has_edge(id, id) && network.degree(id) == others
        }))
    }
}

/// Every node has exactly two neighbours and the graph is one piece.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleGraph;

impl Restriction for CycleGraph {
    topological!(CycleGraph);

    fn check(&self, network: &Network) -> SimResult<bool> {
        let all_degree_two = network.node_ids().into_iter().all(|id| network.degree(id) == 2);
        Ok(all_degree_two && network.weak_components().len() == 1)
    }
}

/// A cycle whose nodes agree on left and right.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrientedCycleGraph;

impl Restriction for OrientedCycleGraph {
    topological!(OrientedCycleGraph);

    fn check(&self, _network: &Network) -> SimResult<bool> {
        not_modeled(self)
    }
}

/// One piece with `n - 1` edges, with directions ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeGraph;

impl Restriction for TreeGraph {
    topological!(TreeGraph);

    fn check(&self, network: &Network) -> SimResult<bool> {
        if network.is_empty() {
            return Ok(false);
        }
        let links = network
            .undirected_adjacency()
            .values()
            .map(BTreeSet::len)
            .sum::<usize>()
            / 2;
        Ok(links == network.len() - 1 && network.weak_components().len() == 1)
    }
}

/// One centre linked to all others, every other node linked only to it.
/// Networks of one or two nodes are stars.
#[derive(Debug, Clone, Copy, Default)]
pub struct StarGraph;

impl Restriction for StarGraph {
    topological!(StarGraph);

    fn check(&self, network: &Network) -> SimResult<bool> {
        if network.len() <= 2 {
            return Ok(true);
        }
        let others = network.len() - 1;
        let mut centres = 0;
        let mut leaves = 0;
        for id in network.node_ids() {
            match network.degree(id) {
                d if d == others => centres += 1,
                1 => leaves += 1,
                _ => return Ok(false),
            }
        }
        Ok(centres == 1 && leaves == others)
    }
}

/// A hypercube of any dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperCubeGraph;

impl Restriction for HyperCubeGraph {
    topological!(HyperCubeGraph);

    fn check(&self, _network: &Network) -> SimResult<bool> {
        not_modeled(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CompleteRange, NetworkConfig, Position};

    /// Nodes on the x axis, `spacing` apart, with unit-disc range `range`.
    fn line(n: usize, spacing: f64, range: f64) -> Network {
        let mut net = Network::new(NetworkConfig::default().with_comm_range(range));
        for i in 0..n {
            net.add_node_at(Position::new(10.0 + i as f64 * spacing, 10.0)).unwrap();
        }
        net
    }

    #[test]
    fn test_path_is_tree_not_cycle() {
        let net = line(5, 10.0, 15.0);
        assert_eq!(TreeGraph.check(&net), Ok(true));
        assert_eq!(CycleGraph.check(&net), Ok(false));
        assert_eq!(Connectivity.check(&net), Ok(true));
        assert_eq!(StarGraph.check(&net), Ok(false));
    }

    #[test]
    fn test_reciprocal_directed_path_is_tree() {
        let mut net = Network::new(NetworkConfig::directed().with_comm_range(15.0));
        for i in 0..5 {
            net.add_node_at(Position::new(10.0 + i as f64 * 10.0, 10.0)).unwrap();
        }
        assert!(net.is_reciprocal());
        assert_eq!(net.edge_count(), 8);
        assert_eq!(TreeGraph.check(&net), Ok(true));
    }

    #[test]
    fn test_disconnected_line() {
        let net = line(4, 50.0, 15.0);
        assert_eq!(Connectivity.check(&net), Ok(false));
        assert_eq!(TreeGraph.check(&net), Ok(false));
    }

    #[test]
    fn test_small_networks_are_stars() {
        assert_eq!(StarGraph.check(&line(2, 100.0, 15.0)), Ok(true));
        assert_eq!(StarGraph.check(&line(3, 10.0, 15.0)), Ok(true), "3-node path is a star");
    }

    #[test]
    fn test_star_shape() {
        let mut net = Network::new(NetworkConfig::default().with_comm_range(12.0));
        net.add_node_at(Position::new(50.0, 50.0)).unwrap();
        for (x, y) in [(60.0, 50.0), (40.0, 50.0), (50.0, 60.0), (50.0, 40.0)] {
            net.add_node_at(Position::new(x, y)).unwrap();
        }
        assert_eq!(StarGraph.check(&net), Ok(true));
        assert_eq!(TreeGraph.check(&net), Ok(true));
    }

    #[test]
    fn test_complete_graph_and_cycle_of_three() {
        let mut net = Network::new(NetworkConfig::default()).with_range(CompleteRange);
        for i in 0..3 {
            net.add_node_at(Position::new(i as f64, 1.0)).unwrap();
        }
        assert_eq!(CompleteGraph.check(&net), Ok(true));
        assert_eq!(CycleGraph.check(&net), Ok(true), "a triangle is a cycle");
        net.add_node_at(Position::new(9.0, 9.0)).unwrap();
        assert_eq!(CycleGraph.check(&net), Ok(false));
    }

    #[test]
    fn test_unmodeled_shapes() {
        let net = line(3, 10.0, 15.0);
        assert!(HyperCubeGraph.check(&net).is_err());
        assert!(OrientedCycleGraph.check(&net).is_err());
    }
}
