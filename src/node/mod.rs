//! Simulated entities and their mailboxes.
//!
//! A node never talks to another node directly: it queues messages in its
//! outbox and the network's transport moves them into other inboxes.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`NodeId`] newtype |
//! | [`mailbox`] | [`Mailbox`] with one-step inbox latency |
//! | [`state`] | [`Node`], [`Memory`] |

pub mod id;
pub mod mailbox;
pub mod state;

// Flat re-exports so callers can use `distsim::node::NodeId` etc.
pub use id::NodeId;
pub use mailbox::Mailbox;
pub use state::{Memory, Node, DEFAULT_COMM_RANGE};

#[cfg(test)]
mod tests;
