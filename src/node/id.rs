//! Node ID: a lightweight, ordered, copyable node identifier.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh node ids. Ids are unique for the life of the process so
/// a node keeps its identity when it moves between networks.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// A unique identifier for a simulated node.
///
/// `NodeId` is a newtype around `u64` rather than a bare integer so it
/// cannot be confused with message ids, clocks or step counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node ID from a raw integer.
    #[inline]
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    /// Mint a fresh id, strictly greater than every id minted before.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the underlying integer.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N{}", self.0)
    }
}
