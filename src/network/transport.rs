//! Message transport: moves outboxes into per-edge pools and delivers
//! what is due.
//!
//! One call to [`Network::communicate`] is one transport round:
//!
//! 1. Every outbox is drained in ascending node order, oldest message
//!    first. Broadcasts and multi-destination messages are expanded into
//!    one fresh-id copy per addressee.
//! 2. Each copy is either lost (kept in the lost pool of its edge) or
//!    given a delay and put in the transit pool of its edge.
//! 3. Every in-transit countdown is decremented and the messages that
//!    reached zero are delivered: in id order with head-of-line blocking
//!    when ordered, scrambled when unordered.

use tracing::{debug, trace, warn};

use crate::error::{SimError, SimResult};
use crate::message::{Destination, Message};
use crate::node::NodeId;
use crate::observer::SimEvent;

use super::communication::TransportView;
use super::Network;

/// A message on its way across an edge.
#[derive(Debug)]
pub struct InTransit {
    pub message: Message,
    /// Transport rounds left before delivery.
    pub remaining: u32,
}

impl Network {
    /// Run one transport round.
    ///
    /// Every due message is attempted. If some of them cannot be delivered
    /// (non-neighbour destination with routing off, or a destination that
    /// left the network) the rest are still delivered and the first
    /// failure is returned.
    pub fn communicate(&mut self) -> SimResult<()> {
        let view = TransportView {
            node_count: self.len(),
            pending_outbox: self.nodes.values().map(|n| n.outbox().count()).sum(),
        };

        for source in self.node_ids() {
            let outgoing = match self.nodes.get_mut(&source) {
                Some(node) => node.drain_outbox(),
                None => continue,
            };
            for message in outgoing {
                for (destination, copy) in self.expand(source, message) {
                    self.enqueue(view, (source, destination), copy);
                }
            }
        }

        let mut due = Vec::new();
        for (edge, queue) in self.transit.iter_mut() {
            for entry in queue.iter_mut() {
                entry.remaining = entry.remaining.saturating_sub(1);
            }
            queue.sort_by_key(|entry| entry.message.id());

            let ready: Vec<InTransit> = if self.communication.is_ordered() {
                let head = queue.iter().take_while(|entry| entry.remaining == 0).count();
                queue.drain(..head).collect()
            } else {
                let (ready, waiting) = std::mem::take(queue)
                    .into_iter()
                    .partition(|entry| entry.remaining == 0);
                *queue = waiting;
                ready
            };

            let order = self.communication.delivery_order(ready.len(), &mut self.rng);
            let mut slots: Vec<Option<InTransit>> = ready.into_iter().map(Some).collect();
            for index in order {
                if let Some(entry) = slots[index].take() {
                    due.push((*edge, entry.message));
                }
            }
        }
        self.transit.retain(|_, queue| !queue.is_empty());

        let mut failure = None;
        for ((from, to), message) in due {
            if let Err(e) = self.deliver(from, to, message) {
                warn!(error = %e, "dropping undeliverable message");
                failure.get_or_insert(e);
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Turn one outbox entry into `(destination, message)` pairs.
    fn expand(&self, source: NodeId, message: Message) -> Vec<(NodeId, Message)> {
        match &message.destination {
            Destination::Node(to) => {
                let to = *to;
                vec![(to, message)]
            }
            Destination::Nodes(targets) => targets
                .iter()
                .map(|to| (*to, message.duplicate_to(*to)))
                .collect(),
            Destination::Broadcast => {
                let neighbours = self.neighbors(source);
                if neighbours.is_empty() {
                    debug!(node = %source, message = %message.id(), "broadcast with no neighbours");
                }
                neighbours
                    .into_iter()
                    .map(|to| (to, message.duplicate_to(to)))
                    .collect()
            }
        }
    }

    fn enqueue(&mut self, view: TransportView, edge: (NodeId, NodeId), message: Message) {
        if self.communication.loss.is_lost(&view, &message, &mut self.rng) {
            debug!(message = %message.id(), from = %edge.0, to = %edge.1, "message lost");
            self.lost.entry(edge).or_default().push(message);
            return;
        }
        let remaining = self.communication.delay.delay(&view, &message, &mut self.rng);
        trace!(message = %message.id(), from = %edge.0, to = %edge.1, remaining, "in transit");
        self.transit
            .entry(edge)
            .or_default()
            .push(InTransit { message, remaining });
    }

    fn deliver(&mut self, from: NodeId, to: NodeId, message: Message) -> SimResult<()> {
        let undeliverable = SimError::Undeliverable {
            message: message.id(),
            from,
            to,
        };
        if !self.has_edge(from, to) && !self.config.routing {
            return Err(undeliverable);
        }
        let message_id = message.id();
        let source = message.source;
        let Some(node) = self.nodes.get_mut(&to) else {
            return Err(undeliverable);
        };
        node.push_to_inbox(message);
        self.observers.notify(SimEvent::MessageDelivered {
            message: message_id,
            from: source,
            to,
        });
        Ok(())
    }

    // ── Inspection ────────────────────────────────────────

    /// Messages currently travelling from `from` to `to`.
    pub fn in_transit(&self, from: NodeId, to: NodeId) -> &[InTransit] {
        self.transit.get(&(from, to)).map_or(&[], Vec::as_slice)
    }

    /// Messages lost on the way from `from` to `to`.
    pub fn lost(&self, from: NodeId, to: NodeId) -> &[Message] {
        self.lost.get(&(from, to)).map_or(&[], Vec::as_slice)
    }

    pub fn in_transit_count(&self) -> usize {
        self.transit.values().map(Vec::len).sum()
    }

    pub fn lost_count(&self) -> usize {
        self.lost.values().map(Vec::len).sum()
    }
}
