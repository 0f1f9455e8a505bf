//! Axioms of the model. They hold for every run by construction.

use crate::error::SimResult;
use crate::network::Network;

use super::{Restriction, RestrictionCategory};

/// Checked for every algorithm before its own restrictions.
pub const AXIOMS: &[&dyn Restriction] = &[&FiniteCommunicationDelays, &LocalOrientation];

/// In the absence of failures, communication delays are finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteCommunicationDelays;

impl Restriction for FiniteCommunicationDelays {
    fn name(&self) -> &'static str {
        "FiniteCommunicationDelays"
    }

    fn category(&self) -> RestrictionCategory {
        RestrictionCategory::Axiom
    }

    fn check(&self, _network: &Network) -> SimResult<bool> {
        Ok(true)
    }
}

/// A node can tell its in-neighbours and out-neighbours apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOrientation;

impl Restriction for LocalOrientation {
    fn name(&self) -> &'static str {
        "LocalOrientation"
    }

    fn category(&self) -> RestrictionCategory {
        RestrictionCategory::Axiom
    }

    fn check(&self, _network: &Network) -> SimResult<bool> {
        Ok(true)
    }
}
