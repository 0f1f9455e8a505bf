//! Messages exchanged between nodes.
//!
//! A `Message` is the only thing that ever crosses from one node to
//! another. Every message carries a process-unique, strictly increasing
//! `MessageId`; copying a message (for fan-out or forwarding) always mints
//! a new id, which is why `Message` deliberately does not implement
//! `Clone`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::node::NodeId;

/// Header carried by initialization messages.
pub const INI: &str = "INI";

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(0);

// ── Message ID ────────────────────────────────────────────────────────

/// A unique, strictly increasing message identifier.
///
/// Ordered transport delivers messages on an edge in `MessageId` order,
/// which corresponds to creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageId(u64);

impl MessageId {
    /// Wrap a raw u64 into a `MessageId`.
    #[inline]
    pub fn new(raw: u64) -> Self {
        MessageId(raw)
    }

    /// Mint the next id.
    pub fn fresh() -> Self {
        MessageId(NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "M{}", self.0)
    }
}

// ── Meta header ───────────────────────────────────────────────────────

/// Classifies why a message exists. The engine maps it to a handler action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaHeader {
    /// Ordinary node-to-node traffic.
    #[default]
    Normal,
    /// Injected by an initializer to wake a node up.
    Initialization,
    /// Injected by a fired alarm.
    Alarm,
}

impl std::fmt::Display for MetaHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaHeader::Normal => write!(f, "NORMAL"),
            MetaHeader::Initialization => write!(f, "INITIALIZATION"),
            MetaHeader::Alarm => write!(f, "ALARM"),
        }
    }
}

// ── Destination ───────────────────────────────────────────────────────

/// Where a message should go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Destination {
    /// Every current neighbour of the sender.
    #[default]
    Broadcast,
    /// A single node.
    Node(NodeId),
    /// Several nodes; the sender fans out one copy per entry.
    Nodes(Vec<NodeId>),
}

impl Destination {
    /// The single addressee, if there is exactly one.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Destination::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<NodeId> for Destination {
    fn from(id: NodeId) -> Self {
        Destination::Node(id)
    }
}

impl From<Vec<NodeId>> for Destination {
    fn from(ids: Vec<NodeId>) -> Self {
        Destination::Nodes(ids)
    }
}

// ── Message ───────────────────────────────────────────────────────────

/// A message in a mailbox or in transit.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    id: MessageId,
    pub source: Option<NodeId>,
    pub destination: Destination,
    pub header: String,
    pub data: Value,
    pub meta_data: BTreeMap<String, Value>,
    pub meta_header: MetaHeader,
}

impl Message {
    /// A broadcast message with the given header and payload.
    pub fn new(header: impl Into<String>, data: Value) -> Self {
        Message {
            id: MessageId::fresh(),
            source: None,
            destination: Destination::Broadcast,
            header: header.into(),
            data,
            meta_data: BTreeMap::new(),
            meta_header: MetaHeader::Normal,
        }
    }

    /// An initialization message addressed to `node`.
    pub fn initialization(node: NodeId) -> Self {
        Message::new(INI, Value::Null)
            .to(node)
            .with_meta_header(MetaHeader::Initialization)
    }

    /// Builder: set the destination.
    pub fn to(mut self, destination: impl Into<Destination>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Builder: set the meta header.
    pub fn with_meta_header(mut self, meta_header: MetaHeader) -> Self {
        self.meta_header = meta_header;
        self
    }

    /// Builder: attach a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta_data.insert(key.into(), value);
        self
    }

    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Deep copy under a fresh id.
    pub fn duplicate(&self) -> Self {
        Message {
            id: MessageId::fresh(),
            source: self.source,
            destination: self.destination.clone(),
            header: self.header.clone(),
            data: self.data.clone(),
            meta_data: self.meta_data.clone(),
            meta_header: self.meta_header,
        }
    }

    /// Deep copy under a fresh id, addressed to a single node.
    pub fn duplicate_to(&self, node: NodeId) -> Self {
        let mut copy = self.duplicate();
        copy.destination = Destination::Node(node);
        copy
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = self.source.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        let destination = match &self.destination {
            Destination::Broadcast => "*".to_string(),
            Destination::Node(id) => id.to_string(),
            Destination::Nodes(ids) => format!("{} nodes", ids.len()),
        };
        write!(
            f,
            "{} {}->{} [{}] {}",
            self.id, source, destination, self.meta_header, self.header
        )
    }
}
