//! Tests for `Node` outside of any network.

use serde_json::{json, Value};

use crate::message::{Destination, Message};
use crate::network::{Network, Position};
use crate::node::{Node, NodeId, DEFAULT_COMM_RANGE};

// ── Identity ──────────────────────────────────────────────────────────

#[test]
fn test_new_node_defaults() {
    let node = Node::new();
    assert_eq!(node.status(), None);
    assert_eq!(node.clock(), 0);
    assert_eq!(node.comm_range(), DEFAULT_COMM_RANGE);
    assert_eq!(node.owner(), None);
    assert!(node.is_quiet());
}

#[test]
fn test_ids_follow_creation_order() {
    let first = Node::new();
    let second = Node::with_comm_range(5.0);
    assert!(first.id() < second.id());
    assert_eq!(second.comm_range(), 5.0);
}

#[test]
fn test_display_includes_status() {
    let mut node = Node::new();
    let id = node.id();
    assert_eq!(node.to_string(), id.to_string());
    node.set_status(Some("IDLE"));
    assert_eq!(node.to_string(), format!("{}(IDLE)", id));
}

#[test]
fn test_set_status_returns_previous() {
    let mut node = Node::new();
    assert_eq!(node.set_status(Some("A")), None);
    assert_eq!(node.set_status(Some("B")), Some("A"));
    assert_eq!(node.status(), Some("B"));
}

// ── Mailbox through the node ──────────────────────────────────────────

#[test]
fn test_inbox_latency_on_standalone_node() {
    let mut node = Node::new();
    node.push_to_inbox(Message::new("a", Value::Null));
    node.push_to_inbox(Message::new("b", Value::Null));

    assert!(node.receive().is_none());
    assert_eq!(node.receive().map(|m| m.header), Some("a".to_string()));
    assert_eq!(node.receive().map(|m| m.header), Some("b".to_string()));
    assert!(node.receive().is_none());
    assert!(node.is_quiet());
}

#[test]
fn test_outbox_keeps_queue_order() {
    let mut node = Node::new();
    let target = NodeId::new(3);
    node.push_to_outbox(Message::new("x", json!(1)), target.into());
    node.push_to_outbox(Message::new("y", json!(2)), Destination::Broadcast);

    let headers: Vec<&str> = node.outbox().map(|m| m.header.as_str()).collect();
    assert_eq!(headers, vec!["x", "y"]);
    assert!(!node.is_quiet());

    let drained = node.drain_outbox();
    assert_eq!(drained[0].destination, Destination::Node(target));
    assert_eq!(drained[1].destination, Destination::Broadcast);
    assert!(node.is_quiet());
}

#[test]
fn test_remove_specific_inbox_message() {
    let mut node = Node::new();
    let keep = Message::new("keep", Value::Null);
    let drop = Message::new("drop", Value::Null);
    let drop_id = drop.id();
    node.push_to_inbox(keep);
    node.push_to_inbox(drop);

    assert!(node.remove_from_inbox(drop_id).is_some());
    let headers: Vec<&str> = node.inbox().map(|m| m.header.as_str()).collect();
    assert_eq!(headers, vec!["keep"]);
}

// ── Reset ─────────────────────────────────────────────────────────────

#[test]
fn test_reset_clears_state_but_keeps_identity() {
    let mut node = Node::with_comm_range(42.0);
    let id = node.id();
    node.memory.insert("k".into(), json!("v"));
    node.set_status(Some("DONE"));
    node.tick();
    node.tick();
    node.push_to_inbox(Message::new("a", Value::Null));
    node.push_to_outbox(Message::new("b", Value::Null), Destination::Broadcast);

    node.reset();
    assert_eq!(node.id(), id);
    assert_eq!(node.comm_range(), 42.0);
    assert!(node.memory.is_empty());
    assert_eq!(node.status(), None);
    assert_eq!(node.clock(), 0);
    assert!(node.is_quiet());
}

#[test]
fn test_reset_rearms_latency() {
    let mut node = Node::new();
    node.push_to_inbox(Message::new("a", Value::Null));
    node.receive();
    node.reset();

    node.push_to_inbox(Message::new("b", Value::Null));
    assert!(node.receive().is_none(), "fresh delivery after reset is hidden once");
    assert!(node.receive().is_some());
}

// ── Ownership ─────────────────────────────────────────────────────────

#[test]
fn test_owner_tracks_network() {
    let mut net = Network::default();
    let node = Node::new();
    let id = net.add_node(node, Some(Position::new(1.0, 1.0))).unwrap();
    assert_eq!(net.node(id).unwrap().owner(), Some(net.id()));

    let released = net.remove_node(id).unwrap();
    assert_eq!(released.owner(), None);
    assert_eq!(released.id(), id);
}
