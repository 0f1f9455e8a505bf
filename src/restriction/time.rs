//! Time: delay bounds, clocks and start synchrony.

use crate::error::SimResult;
use crate::network::{Network, TransportView};

use super::{holds_initialization, Restriction, RestrictionCategory};

macro_rules! timing {
    ($name:ident) => {
        fn name(&self) -> &'static str {
            stringify!($name)
        }

        fn category(&self) -> RestrictionCategory {
            RestrictionCategory::Time
        }
    };
}

fn transport_view(network: &Network) -> TransportView {
    TransportView {
        node_count: network.len(),
        pending_outbox: network.nodes().map(|n| n.outbox().count()).sum(),
    }
}

/// Some constant bounds every delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedCommunicationDelays;

impl Restriction for BoundedCommunicationDelays {
    timing!(BoundedCommunicationDelays);

    fn check(&self, network: &Network) -> SimResult<bool> {
        let view = transport_view(network);
        Ok(network.communication().delay.max_delay(&view).is_some())
    }
}

/// Every message is delivered in the transport round it is picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitaryCommunicationDelays;

impl Restriction for UnitaryCommunicationDelays {
    timing!(UnitaryCommunicationDelays);

    fn check(&self, network: &Network) -> SimResult<bool> {
        let view = transport_view(network);
        Ok(network
            .communication()
            .delay
            .max_delay(&view)
            .is_some_and(|bound| bound <= 1))
    }
}

/// All local clocks show the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynchronizedClocks;

impl Restriction for SynchronizedClocks {
    timing!(SynchronizedClocks);

    fn check(&self, network: &Network) -> SimResult<bool> {
        let mut clocks = network.nodes().map(|n| n.clock());
        let Some(first) = clocks.next() else {
            return Ok(true);
        };
        Ok(clocks.all(|clock| clock == first))
    }
}

/// Every node holds an initialization message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimultaneousStart;

impl Restriction for SimultaneousStart {
    timing!(SimultaneousStart);

    fn check(&self, network: &Network) -> SimResult<bool> {
        Ok(network.nodes().all(holds_initialization))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::network::{CommunicationModel, NetworkConfig, Position};

    fn pair() -> Network {
        let mut net = Network::new(NetworkConfig::default());
        net.add_node_at(Position::new(1.0, 1.0)).unwrap();
        net.add_node_at(Position::new(5.0, 1.0)).unwrap();
        net
    }

    #[test]
    fn test_delay_bounds_follow_policy() {
        let mut net = pair();
        net.set_communication(CommunicationModel::ideal());
        assert_eq!(BoundedCommunicationDelays.check(&net), Ok(true));
        assert_eq!(UnitaryCommunicationDelays.check(&net), Ok(true));

        net.set_communication(CommunicationModel::random_delay());
        assert_eq!(BoundedCommunicationDelays.check(&net), Ok(true));
        assert_eq!(UnitaryCommunicationDelays.check(&net), Ok(false));

        net.set_communication(CommunicationModel::throttled());
        assert_eq!(BoundedCommunicationDelays.check(&net), Ok(false));
    }

    #[test]
    fn test_clocks_drift_apart() {
        let mut net = pair();
        assert_eq!(SynchronizedClocks.check(&net), Ok(true));
        net.increment_node_clocks();
        assert_eq!(SynchronizedClocks.check(&net), Ok(true));
        let first = net.node_ids()[0];
        net.node_mut(first).unwrap().tick();
        assert_eq!(SynchronizedClocks.check(&net), Ok(false));
    }

    #[test]
    fn test_simultaneous_start() {
        let mut net = pair();
        let ids = net.node_ids();
        net.push_to_inbox(ids[0], Message::initialization(ids[0])).unwrap();
        assert_eq!(SimultaneousStart.check(&net), Ok(false));
        net.push_to_inbox(ids[1], Message::initialization(ids[1])).unwrap();
        assert_eq!(SimultaneousStart.check(&net), Ok(true));
    }
}
