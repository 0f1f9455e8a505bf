//! `Mailbox`: a node's inbox and outbox with one-step inbox latency.

use std::collections::VecDeque;

use crate::message::{Destination, Message, MessageId};

/// Inbox and outbox of a single node.
///
/// A message pushed into an empty inbox stays invisible to [`receive`]
/// until the following call, so nodes never react to traffic that arrived
/// during the step they are currently executing.
///
/// [`receive`]: Mailbox::receive
#[derive(Debug)]
pub struct Mailbox {
    inbox: VecDeque<Message>,
    outbox: VecDeque<Message>,
    inbox_delay: bool,
}

impl Mailbox {
    pub fn new() -> Self {
        Mailbox {
            inbox: VecDeque::new(),
            outbox: VecDeque::new(),
            inbox_delay: true,
        }
    }

    /// Deliver a message into the inbox.
    pub fn push_to_inbox(&mut self, message: Message) {
        self.inbox_delay = self.inbox_delay || self.inbox.is_empty();
        self.inbox.push_back(message);
    }

    /// Take the oldest visible message, honouring the latency flag.
    ///
    /// Every call clears the flag, so a message that arrived in an empty
    /// inbox becomes visible on the next call.
    pub fn receive(&mut self) -> Option<Message> {
        let message = if self.inbox_delay {
            None
        } else {
            self.inbox.pop_front()
        };
        self.inbox_delay = false;
        message
    }

    /// Stamp `destination` on the message and queue it for transport.
    pub fn push_to_outbox(&mut self, mut message: Message, destination: Destination) {
        message.destination = destination;
        self.outbox.push_back(message);
    }

    /// Remove every queued outbound message, in the order they were queued.
    pub fn drain_outbox(&mut self) -> Vec<Message> {
        self.outbox.drain(..).collect()
    }

    /// Remove a specific message from the inbox.
    pub fn remove_from_inbox(&mut self, id: MessageId) -> Option<Message> {
        let index = self.inbox.iter().position(|m| m.id() == id)?;
        self.inbox.remove(index)
    }

    /// Messages in the inbox, oldest first.
    pub fn inbox(&self) -> impl Iterator<Item = &Message> {
        self.inbox.iter()
    }

    /// Messages in the outbox, oldest first.
    pub fn outbox(&self) -> impl Iterator<Item = &Message> {
        self.outbox.iter()
    }

    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }

    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    /// True when both boxes are empty.
    pub fn is_empty(&self) -> bool {
        self.inbox.is_empty() && self.outbox.is_empty()
    }

    pub fn clear(&mut self) {
        self.inbox.clear();
        self.outbox.clear();
        self.inbox_delay = true;
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
