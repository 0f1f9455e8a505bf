//! Observer events emitted by the engine.
//!
//! The engine never formats or persists these itself. Anything that wants
//! to watch a run (a visualizer, a test, a trace dumper) implements
//! [`Observer`] and registers with the network or the simulation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::message::MessageId;
use crate::node::NodeId;

// ── Events ────────────────────────────────────────────────────────────

/// A named engine event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum SimEvent {
    AlgorithmStarted {
        algorithm: String,
    },
    StepDone {
        algorithm: String,
        step: u64,
    },
    AlgorithmFinished {
        algorithm: String,
    },
    NodeStatusChanged {
        node: NodeId,
        previous: Option<&'static str>,
        current: Option<&'static str>,
    },
    MessageSent {
        message: MessageId,
        from: NodeId,
    },
    MessageDelivered {
        message: MessageId,
        from: Option<NodeId>,
        to: NodeId,
    },
    NetworkChanged,
    /// Raised by algorithm code through `NodeContext::notify`.
    Custom {
        name: String,
        node: NodeId,
    },
}

impl SimEvent {
    /// Stable event name. Every custom event reports `"custom"`; its own
    /// name is in the variant.
    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::AlgorithmStarted { .. } => "algorithm_started",
            SimEvent::StepDone { .. } => "step_done",
            SimEvent::AlgorithmFinished { .. } => "algorithm_finished",
            SimEvent::NodeStatusChanged { .. } => "node_status_changed",
            SimEvent::MessageSent { .. } => "message_sent",
            SimEvent::MessageDelivered { .. } => "message_delivered",
            SimEvent::NetworkChanged => "network_changed",
            SimEvent::Custom { .. } => "custom",
        }
    }
}

impl std::fmt::Display for SimEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimEvent::AlgorithmStarted { algorithm } => write!(f, "{} started", algorithm),
            SimEvent::StepDone { algorithm, step } => write!(f, "{} step {}", algorithm, step),
            SimEvent::AlgorithmFinished { algorithm } => write!(f, "{} finished", algorithm),
            SimEvent::NodeStatusChanged { node, previous, current } => write!(
                f,
                "{} {} -> {}",
                node,
                previous.unwrap_or("-"),
                current.unwrap_or("-")
            ),
            SimEvent::MessageSent { message, from } => write!(f, "{} sent by {}", message, from),
            SimEvent::MessageDelivered { message, to, .. } => {
                write!(f, "{} delivered to {}", message, to)
            }
            SimEvent::NetworkChanged => write!(f, "network changed"),
            SimEvent::Custom { name, node } => write!(f, "{} raised by {}", name, node),
        }
    }
}

// ── Observer ──────────────────────────────────────────────────────────

/// Receives engine events.
pub trait Observer {
    fn notify(&mut self, event: &SimEvent);
}

/// An observer backed by a closure.
impl<F> Observer for F
where
    F: FnMut(&SimEvent),
{
    fn notify(&mut self, event: &SimEvent) {
        (self)(event);
    }
}

/// The set of observers attached to a network.
#[derive(Default)]
pub struct Observers {
    list: Vec<Box<dyn Observer>>,
}

impl Observers {
    pub fn new() -> Self {
        Observers { list: Vec::new() }
    }

    pub fn add(&mut self, observer: Box<dyn Observer>) {
        self.list.push(observer);
    }

    pub fn notify(&mut self, event: SimEvent) {
        for observer in &mut self.list {
            observer.notify(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Observers({})", self.list.len())
    }
}

// ── Recorder ──────────────────────────────────────────────────────────

/// Keeps every event in memory. Clones share the same log, so one handle
/// can be registered while another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<SimEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.borrow().clone()
    }

    /// How many events with this name were recorded. Custom events match
    /// on their own name as well as on `"custom"`.
    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| match e {
                SimEvent::Custom { name: custom, .. } if custom == name => true,
                e => e.name() == name,
            })
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Observer for EventRecorder {
    fn notify(&mut self, event: &SimEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |e: &SimEvent| seen.push(e.name());
            observer.notify(&SimEvent::NetworkChanged);
        }
        assert_eq!(seen, vec!["network_changed"]);
    }

    #[test]
    fn test_recorder_clones_share_log() {
        let recorder = EventRecorder::new();
        let mut observers = Observers::new();
        observers.add(Box::new(recorder.clone()));

        observers.notify(SimEvent::AlgorithmStarted { algorithm: "Flood".into() });
        observers.notify(SimEvent::StepDone { algorithm: "Flood".into(), step: 1 });
        observers.notify(SimEvent::StepDone { algorithm: "Flood".into(), step: 2 });

        assert_eq!(recorder.len(), 3);
        assert_eq!(recorder.count("step_done"), 2);
        assert_eq!(recorder.count("algorithm_finished"), 0);
    }

    #[test]
    fn test_status_change_display() {
        let e = SimEvent::NodeStatusChanged {
            node: NodeId::new(2),
            previous: None,
            current: Some("IDLE"),
        };
        assert_eq!(e.to_string(), "N2 - -> IDLE");
    }

    #[test]
    fn test_custom_events_counted_by_own_name() {
        let mut recorder = EventRecorder::new();
        let node = NodeId::new(4);
        recorder.notify(&SimEvent::Custom { name: "leader_found".into(), node });
        recorder.notify(&SimEvent::Custom { name: "leader_found".into(), node });
        recorder.notify(&SimEvent::Custom { name: "round_over".into(), node });

        assert_eq!(recorder.count("leader_found"), 2);
        assert_eq!(recorder.count("custom"), 3);
        assert_eq!(recorder.events()[2].to_string(), "round_over raised by N4");
    }
}
