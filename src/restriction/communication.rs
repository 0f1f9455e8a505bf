//! Communication: ordering guarantees and link reciprocity.

use crate::error::SimResult;
use crate::network::Network;

use super::{Restriction, RestrictionCategory};

/// Messages on one link arrive in the order they were sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageOrdering;

impl Restriction for MessageOrdering {
    fn name(&self) -> &'static str {
        "MessageOrdering"
    }

    fn category(&self) -> RestrictionCategory {
        RestrictionCategory::Communication
    }

    fn check(&self, network: &Network) -> SimResult<bool> {
        Ok(network.communication().is_ordered())
    }
}

/// Every node's out-neighbours are exactly its in-neighbours.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReciprocalCommunication;

impl Restriction for ReciprocalCommunication {
    fn name(&self) -> &'static str {
        "ReciprocalCommunication"
    }

    fn category(&self) -> RestrictionCategory {
        RestrictionCategory::Communication
    }

    fn check(&self, network: &Network) -> SimResult<bool> {
        Ok(!network.is_directed() || network.is_reciprocal())
    }
}

/// Reciprocal links, and a node knows which in-link pairs with which
/// out-link. Neighbours are addressed by id, so the pairing is always
/// known and this reduces to reciprocity.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidirectionalLinks;

impl Restriction for BidirectionalLinks {
    fn name(&self) -> &'static str {
        "BidirectionalLinks"
    }

    fn category(&self) -> RestrictionCategory {
        RestrictionCategory::Communication
    }

    fn check(&self, network: &Network) -> SimResult<bool> {
        ReciprocalCommunication.check(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CommunicationModel, NetworkConfig, Position, SquareDisc};

    #[test]
    fn test_ordering_follows_model() {
        let mut net = Network::new(NetworkConfig::default());
        net.set_communication(CommunicationModel::ideal());
        assert_eq!(MessageOrdering.check(&net), Ok(true));
        net.set_communication(CommunicationModel::unordered());
        assert_eq!(MessageOrdering.check(&net), Ok(false));
    }

    #[test]
    fn test_undirected_is_reciprocal() {
        let mut net = Network::new(NetworkConfig::default());
        net.add_node_at(Position::new(1.0, 1.0)).unwrap();
        net.add_node_at(Position::new(2.0, 1.0)).unwrap();
        assert_eq!(ReciprocalCommunication.check(&net), Ok(true));
        assert_eq!(BidirectionalLinks.check(&net), Ok(true));
    }

    #[test]
    fn test_directed_reciprocity_matches_edges() {
        let mut net = Network::new(NetworkConfig::directed().with_seed(11)).with_range(SquareDisc);
        for i in 0..8 {
            net.add_node_at(Position::new(10.0 + 30.0 * i as f64, 10.0)).unwrap();
        }
        let expected = net
            .edges()
            .into_iter()
            .all(|(a, b)| net.has_edge(b, a));
        assert_eq!(ReciprocalCommunication.check(&net), Ok(expected));
    }
}
