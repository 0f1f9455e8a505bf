//! Structured error types for the simulator.
//!
//! All fallible public APIs return `Result<T, SimError>`. Callers can tell
//! arena misuse (a node that is not in the network) apart from
//! configuration mistakes (a missing parameter) and from verification
//! failures (a restriction that does not hold) without parsing strings.

use thiserror::Error;

use crate::message::MessageId;
use crate::node::NodeId;

/// The top-level error type for the simulator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    // ── Arena errors ──────────────────────────────────────

    /// A node id was referenced but the node is not owned by this network.
    #[error("node {0} not in network")]
    NodeNotInNetwork(NodeId),

    /// The node still records another network as its owner.
    #[error("node {0} is already in another network")]
    NodeInAnotherNetwork(NodeId),

    /// The environment reports that the requested position is not free space.
    #[error("position ({x}, {y}) is not free space")]
    SpaceOccupied { x: f64, y: f64 },

    /// The environment could not produce a free position.
    #[error("no free space found after {tries} tries")]
    NoFreeSpace { tries: usize },

    // ── Algorithm configuration errors ────────────────────

    /// No algorithm is bound to the network, or the cursor ran past the end.
    #[error("algorithm not found: no algorithm is bound to the network")]
    AlgorithmNotFound,

    /// A required parameter was not supplied in the binding.
    #[error("algorithm {algorithm} is missing required parameter '{param}'")]
    MissingParam { algorithm: String, param: String },

    /// The same name is declared required twice along an inheritance chain.
    #[error("parameter '{param}' is declared required more than once")]
    DuplicateRequiredParam { param: String },

    /// The same name is declared both required and default.
    #[error("parameter '{param}' is declared both required and default")]
    ParamConflict { param: String },

    /// A supplied parameter has the wrong shape.
    #[error("algorithm {algorithm} got an invalid value for '{param}': {reason}")]
    InvalidParam {
        algorithm: String,
        param: String,
        reason: String,
    },

    /// A centralized algorithm did not override `run`.
    #[error("algorithm {algorithm} does not implement run()")]
    NotImplemented { algorithm: String },

    // ── Transport errors ──────────────────────────────────

    /// The destination is not a neighbour of the source and routing is off.
    #[error("message {message} from {from} to {to} is undeliverable")]
    Undeliverable {
        message: MessageId,
        from: NodeId,
        to: NodeId,
    },

    // ── Restriction errors ────────────────────────────────

    /// A restriction required by an algorithm does not hold.
    #[error("restriction {restriction} required by {algorithm} does not hold")]
    RestrictionViolated {
        restriction: String,
        algorithm: String,
    },

    /// The restriction has no model in this simulator.
    #[error("restriction {restriction} is not modeled")]
    RestrictionNotModeled { restriction: String },

    // ── Verification errors ───────────────────────────────

    /// A node's status is outside the expected set.
    #[error("node {node} has status {status:?} under {algorithm}, expected one of {expected:?}")]
    UnexpectedStatus {
        node: NodeId,
        algorithm: String,
        status: Option<String>,
        expected: Vec<String>,
    },

    // ── Alarm errors ──────────────────────────────────────

    /// Alarms must be set at least one step into the future.
    #[error("alarm ticks must be positive, got {ticks}")]
    InvalidAlarmTicks { ticks: i64 },
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_node_not_in_network() {
        let e = SimError::NodeNotInNetwork(NodeId::new(5));
        assert_eq!(e.to_string(), "node N5 not in network");
    }

    #[test]
    fn test_error_display_undeliverable_names_endpoints() {
        let e = SimError::Undeliverable {
            message: MessageId::new(7),
            from: NodeId::new(1),
            to: NodeId::new(2),
        };
        let s = e.to_string();
        assert!(s.contains("M7"));
        assert!(s.contains("N1"));
        assert!(s.contains("N2"));
    }

    #[test]
    fn test_error_display_restriction_names_both() {
        let e = SimError::RestrictionViolated {
            restriction: "Connectivity".into(),
            algorithm: "Flood".into(),
        };
        assert!(e.to_string().contains("Connectivity"));
        assert!(e.to_string().contains("Flood"));
    }

    #[test]
    fn test_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(SimError::AlgorithmNotFound);
        assert!(!e.to_string().is_empty());
    }

    #[test]
    fn test_sim_result_err() {
        let r: SimResult<u32> = Err(SimError::InvalidAlarmTicks { ticks: 0 });
        assert!(r.is_err());
    }
}
