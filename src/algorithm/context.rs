//! Contexts handed to algorithm code: [`NodeContext`] while a node runs a
//! handler, [`InitContext`] while the initializer prepares the network.

use crate::error::SimResult;
use crate::message::{Destination, Message};
use crate::network::Network;
use crate::node::{Memory, NodeId};
use crate::observer::SimEvent;
use crate::restriction::{apply_restrictions, Restriction};

use super::alarm::{AlarmBook, AlarmId};
use super::status::StatusValue;

// ── NodeContext ───────────────────────────────────────────────────────

/// What a handler may see and do on behalf of one node.
///
/// Reads go to the whole network; writes are limited to the node's own
/// status, memory, outbox and alarms.
pub struct NodeContext<'a> {
    network: &'a mut Network,
    alarms: &'a mut AlarmBook,
    node: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(network: &'a mut Network, alarms: &'a mut AlarmBook, node: NodeId) -> Self {
        NodeContext {
            network,
            alarms,
            node,
        }
    }

    /// The node this handler runs for.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn network(&self) -> &Network {
        &*self.network
    }

    pub fn status<S: StatusValue>(&self) -> Option<S> {
        self.network.node(self.node).ok()?.status().and_then(S::from_name)
    }

    pub fn set_status<S: StatusValue>(&mut self, status: S) -> SimResult<()> {
        self.network.set_status(self.node, Some(status.name()))
    }

    pub fn memory(&self) -> SimResult<&Memory> {
        Ok(&self.network.node(self.node)?.memory)
    }

    pub fn memory_mut(&mut self) -> SimResult<&mut Memory> {
        Ok(&mut self.network.node_mut(self.node)?.memory)
    }

    pub fn clock(&self) -> SimResult<u64> {
        Ok(self.network.node(self.node)?.clock())
    }

    /// Out-neighbours in ascending order.
    pub fn neighbors(&self) -> Vec<NodeId> {
        self.network.neighbors(self.node)
    }

    /// Stamp this node as source and queue the message. A multi-node
    /// destination queues one fresh-id copy per addressee.
    pub fn send(&mut self, mut message: Message) -> SimResult<()> {
        message.source = Some(self.node);
        match std::mem::take(&mut message.destination) {
            Destination::Nodes(targets) => {
                for target in targets {
                    let copy = message.duplicate_to(target);
                    self.network.push_to_outbox(self.node, copy, Destination::Node(target))?;
                }
                Ok(())
            }
            destination => self.network.push_to_outbox(self.node, message, destination),
        }
    }

    /// Emit a custom event to the network's observers.
    pub fn notify(&mut self, name: impl Into<String>) {
        let event = SimEvent::Custom {
            name: name.into(),
            node: self.node,
        };
        self.network.notify(event);
    }

    // ── Alarms ────────────────────────────────────────────

    pub fn set_alarm(&mut self, ticks: i64, message: Message) -> SimResult<AlarmId> {
        self.alarms.set(self.node, ticks, message)
    }

    pub fn disable_alarm(&mut self, id: AlarmId) -> bool {
        self.alarms.disable(&mut *self.network, id)
    }

    pub fn disable_all_alarms(&mut self) -> usize {
        self.alarms.disable_all_for(&mut *self.network, self.node)
    }

    pub fn update_alarm_time(&mut self, id: AlarmId, diff: i64) -> bool {
        self.alarms.update_time(&mut *self.network, id, diff)
    }
}

// ── InitContext ───────────────────────────────────────────────────────

/// Access granted to an initializer before the first step.
pub struct InitContext<'a> {
    network: &'a mut Network,
    restrictions: &'a [&'a dyn Restriction],
    algorithm: &'a str,
}

impl<'a> InitContext<'a> {
    pub(crate) fn new(
        network: &'a mut Network,
        restrictions: &'a [&'a dyn Restriction],
        algorithm: &'a str,
    ) -> Self {
        InitContext {
            network,
            restrictions,
            algorithm,
        }
    }

    pub fn algorithm(&self) -> &str {
        self.algorithm
    }

    pub fn network(&self) -> &Network {
        &*self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut *self.network
    }

    /// Establish every applicable restriction the algorithm declares.
    pub fn apply_restrictions(&mut self) -> SimResult<()> {
        apply_restrictions(&mut *self.network, self.restrictions)
    }

    /// Wake `node` up with an initialization message.
    pub fn push_initialization(&mut self, node: NodeId) -> SimResult<()> {
        self.network.push_to_inbox(node, Message::initialization(node))
    }

    pub fn set_status<S: StatusValue>(&mut self, node: NodeId, status: S) -> SimResult<()> {
        self.network.set_status(node, Some(status.name()))
    }

    pub fn set_all_statuses<S: StatusValue>(&mut self, status: S) -> SimResult<()> {
        for id in self.network.node_ids() {
            self.network.set_status(id, Some(status.name()))?;
        }
        Ok(())
    }

    /// The node with the smallest id.
    pub fn lowest_node(&self) -> Option<NodeId> {
        self.network.node_ids().first().copied()
    }
}
