//! Restrictions: named preconditions an algorithm may require of the
//! network (topology, reliability, knowledge, communication, time).
//!
//! A restriction is a classifier over the network. Some are also
//! applicable: `apply` establishes the property, for example by writing
//! each node's id into its memory.
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`axioms`] | properties every run satisfies by construction |
//! | [`topological`] | connectivity, shapes, unique initiator |
//! | [`reliability`] | loss-free transport, failure detection |
//! | [`knowledge`] | facts nodes know a priori |
//! | [`communication`] | ordering and link reciprocity |
//! | [`time`] | delay bounds, clocks, simultaneous start |

pub mod axioms;
pub mod communication;
pub mod knowledge;
pub mod reliability;
pub mod time;
pub mod topological;

use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::message::MetaHeader;
use crate::network::Network;
use crate::node::Node;

pub use axioms::{FiniteCommunicationDelays, LocalOrientation, AXIOMS};
pub use communication::{BidirectionalLinks, MessageOrdering, ReciprocalCommunication};
pub use knowledge::{InitialDistinctValues, NetworkSize};
pub use reliability::{
    EdgeFailureDetection, EntityFailureDetection, GuaranteedDelivery, PartialReliability,
    TotalReliability,
};
pub use time::{
    BoundedCommunicationDelays, SimultaneousStart, SynchronizedClocks, UnitaryCommunicationDelays,
};
pub use topological::{
    CompleteGraph, Connectivity, CycleGraph, HyperCubeGraph, OrientedCycleGraph, StarGraph,
    TreeGraph, UniqueInitiator,
};

/// Family a restriction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RestrictionCategory {
    Axiom,
    Topological,
    Reliability,
    Knowledge,
    Communication,
    Time,
}

/// A named precondition over a network.
pub trait Restriction: std::fmt::Debug + Sync {
    fn name(&self) -> &'static str;

    fn category(&self) -> RestrictionCategory;

    /// Whether the network satisfies the restriction. Restrictions the
    /// simulator has no model for return `RestrictionNotModeled`.
    fn check(&self, network: &Network) -> SimResult<bool>;

    /// Whether [`apply`](Restriction::apply) establishes the restriction.
    fn is_applicable(&self) -> bool {
        false
    }

    fn apply(&self, _network: &mut Network) -> SimResult<()> {
        Ok(())
    }
}

/// Fail on the first restriction that does not hold, naming it.
pub fn check_restrictions(
    network: &Network,
    restrictions: &[&dyn Restriction],
    algorithm: &str,
) -> SimResult<()> {
    for restriction in restrictions {
        if !restriction.check(network)? {
            return Err(SimError::RestrictionViolated {
                restriction: restriction.name().to_string(),
                algorithm: algorithm.to_string(),
            });
        }
        debug!(restriction = restriction.name(), algorithm, "restriction holds");
    }
    Ok(())
}

/// Apply every applicable restriction, in order.
pub fn apply_restrictions(network: &mut Network, restrictions: &[&dyn Restriction]) -> SimResult<()> {
    for restriction in restrictions.iter().filter(|r| r.is_applicable()) {
        restriction.apply(network)?;
    }
    Ok(())
}

pub(crate) fn not_modeled(restriction: &dyn Restriction) -> SimResult<bool> {
    Err(SimError::RestrictionNotModeled {
        restriction: restriction.name().to_string(),
    })
}

pub(crate) fn holds_initialization(node: &Node) -> bool {
    node.inbox().any(|m| m.meta_header == MetaHeader::Initialization)
}
