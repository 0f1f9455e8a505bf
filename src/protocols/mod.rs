//! Ready-made distributed protocols.
//!
//! | Protocol | Statuses | Terminates with |
//! |---|---|---|
//! | [`Flood`] | INITIATOR, IDLE, DONE | every node DONE, holding the information |
//! | [`MinIdElection`] | CANDIDATE, PRUNED, LEADER | one LEADER (smallest id), the rest PRUNED |

pub mod election;
pub mod flood;

pub use election::{ElectionStatus, MinIdElection};
pub use flood::{Flood, FloodStatus};
