//! `Node`: identity, status, memory, mailboxes and clock of one entity.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::message::{Destination, Message, MessageId};
use crate::network::NetworkId;

use super::id::NodeId;
use super::mailbox::Mailbox;

/// Per-node key/value store used by algorithms.
pub type Memory = BTreeMap<String, Value>;

/// Communication range given to nodes created without an explicit one.
pub const DEFAULT_COMM_RANGE: f64 = 100.0;

/// A simulated entity.
///
/// Nodes are created standalone and handed to a [`Network`] by value; the
/// network owns them afterwards. The `owner` field answers "which network
/// am I in" without a back-reference.
///
/// [`Network`]: crate::network::Network
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    status: Option<&'static str>,
    pub memory: Memory,
    mailbox: Mailbox,
    clock: u64,
    comm_range: f64,
    owner: Option<NetworkId>,
}

impl Node {
    /// A node with a fresh id and the default communication range.
    pub fn new() -> Self {
        Self::with_comm_range(DEFAULT_COMM_RANGE)
    }

    pub fn with_comm_range(comm_range: f64) -> Self {
        Node {
            id: NodeId::fresh(),
            status: None,
            memory: Memory::new(),
            mailbox: Mailbox::new(),
            clock: 0,
            comm_range,
            owner: None,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current status tag, if an algorithm assigned one.
    #[inline]
    pub fn status(&self) -> Option<&'static str> {
        self.status
    }

    /// Set the status and return the previous one.
    pub fn set_status(&mut self, status: Option<&'static str>) -> Option<&'static str> {
        std::mem::replace(&mut self.status, status)
    }

    #[inline]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn tick(&mut self) {
        self.clock += 1;
    }

    #[inline]
    pub fn comm_range(&self) -> f64 {
        self.comm_range
    }

    /// Changing the range of a node inside a network must go through
    /// [`Network::set_comm_range`](crate::network::Network::set_comm_range)
    /// so edges are recalculated.
    pub(crate) fn set_comm_range(&mut self, comm_range: f64) {
        self.comm_range = comm_range;
    }

    /// The network that currently owns this node.
    #[inline]
    pub fn owner(&self) -> Option<NetworkId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<NetworkId>) {
        self.owner = owner;
    }

    // ── Mailbox ───────────────────────────────────────────

    pub fn push_to_inbox(&mut self, message: Message) {
        self.mailbox.push_to_inbox(message);
    }

    pub fn receive(&mut self) -> Option<Message> {
        self.mailbox.receive()
    }

    pub fn push_to_outbox(&mut self, message: Message, destination: Destination) {
        self.mailbox.push_to_outbox(message, destination);
    }

    pub(crate) fn drain_outbox(&mut self) -> Vec<Message> {
        self.mailbox.drain_outbox()
    }

    pub(crate) fn remove_from_inbox(&mut self, id: MessageId) -> Option<Message> {
        self.mailbox.remove_from_inbox(id)
    }

    pub fn inbox(&self) -> impl Iterator<Item = &Message> {
        self.mailbox.inbox()
    }

    pub fn outbox(&self) -> impl Iterator<Item = &Message> {
        self.mailbox.outbox()
    }

    /// True when the node has nothing to read and nothing to send.
    pub fn is_quiet(&self) -> bool {
        self.mailbox.is_empty()
    }

    /// Clear mailboxes, memory, status and clock. Identity and placement
    /// are kept.
    pub fn reset(&mut self) {
        self.mailbox.clear();
        self.memory.clear();
        self.status = None;
        self.clock = 0;
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(status) = self.status {
            write!(f, "({})", status)?;
        }
        Ok(())
    }
}
