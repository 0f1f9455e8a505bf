//! Reliability: faults and their detection.
//!
//! Entity and edge failures are not simulated, so only message loss is
//! observable. The three loss-related restrictions collapse to "the loss
//! policy never drops anything".

use crate::error::SimResult;
use crate::network::Network;

use super::{not_modeled, Restriction, RestrictionCategory};

macro_rules! reliability {
    ($name:ident) => {
        fn name(&self) -> &'static str {
            stringify!($name)
        }

        fn category(&self) -> RestrictionCategory {
            RestrictionCategory::Reliability
        }
    };
}

/// Neither failures nor losses have occurred or will occur.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalReliability;

impl Restriction for TotalReliability {
    reliability!(TotalReliability);

    fn check(&self, network: &Network) -> SimResult<bool> {
        Ok(network.communication().loss.is_lossless())
    }
}

/// No failures will occur from now on.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialReliability;

impl Restriction for PartialReliability {
    reliability!(PartialReliability);

    fn check(&self, network: &Network) -> SimResult<bool> {
        TotalReliability.check(network)
    }
}

/// Every message sent is received uncorrupted.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuaranteedDelivery;

impl Restriction for GuaranteedDelivery {
    reliability!(GuaranteedDelivery);

    fn check(&self, network: &Network) -> SimResult<bool> {
        Ok(network.communication().loss.is_lossless())
    }
}

/// Nodes detect failure and recovery of an adjacent edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeFailureDetection;

impl Restriction for EdgeFailureDetection {
    reliability!(EdgeFailureDetection);

    fn check(&self, _network: &Network) -> SimResult<bool> {
        not_modeled(self)
    }
}

/// Neighbours detect failure and recovery of a node.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityFailureDetection;

impl Restriction for EntityFailureDetection {
    reliability!(EntityFailureDetection);

    fn check(&self, _network: &Network) -> SimResult<bool> {
        not_modeled(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CommunicationModel, NetworkConfig};

    #[test]
    fn test_loss_policy_decides_reliability() {
        let mut net = Network::new(NetworkConfig::default());
        assert_eq!(TotalReliability.check(&net), Ok(true));
        assert_eq!(PartialReliability.check(&net), Ok(true));

        net.set_communication(CommunicationModel::unlikely_random_loss());
        assert_eq!(TotalReliability.check(&net), Ok(false));
        assert_eq!(GuaranteedDelivery.check(&net), Ok(false));
    }

    #[test]
    fn test_failure_detection_not_modeled() {
        let net = Network::default();
        assert!(EdgeFailureDetection.check(&net).is_err());
        assert!(EntityFailureDetection.check(&net).is_err());
    }
}
