//! Network configuration.

use crate::node::DEFAULT_COMM_RANGE;

/// How many random placements are attempted before giving up.
pub const DEFAULT_PLACEMENT_TRIES: usize = 1000;

/// Shape and policy switches of a network.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    /// Evaluate each direction of a candidate edge separately.
    pub directed: bool,
    /// Deliver messages to non-neighbours instead of failing.
    pub routing: bool,
    /// Seed of the network RNG (placement, probabilistic ranges, delay,
    /// loss and unordered shuffles).
    pub seed: u64,
    /// Range given to nodes created by the network itself.
    pub default_comm_range: f64,
    /// Attempts made by the environment to find free space.
    pub placement_tries: usize,
}

impl NetworkConfig {
    /// Undirected, no routing, seed 0.
    pub fn undirected() -> Self {
        NetworkConfig {
            directed: false,
            routing: false,
            seed: 0,
            default_comm_range: DEFAULT_COMM_RANGE,
            placement_tries: DEFAULT_PLACEMENT_TRIES,
        }
    }

    /// Directed, no routing, seed 0.
    pub fn directed() -> Self {
        NetworkConfig {
            directed: true,
            ..Self::undirected()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_routing(mut self, routing: bool) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_comm_range(mut self, comm_range: f64) -> Self {
        self.default_comm_range = comm_range;
        self
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::undirected()
    }
}
