//! Alarms: local timers that inject a message into a node's own inbox
//! after a number of steps, bypassing transport.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{SimError, SimResult};
use crate::message::{Destination, Message, MessageId, MetaHeader};
use crate::network::Network;
use crate::node::NodeId;

/// Handle returned by `set_alarm`, used to disable or move the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct AlarmId(u64);

impl AlarmId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AlarmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// A pending alarm.
#[derive(Debug)]
pub struct Alarm {
    pub id: AlarmId,
    pub node: NodeId,
    pub time_left: i64,
    pub message: Message,
}

/// Pending alarms of one algorithm, plus the ones that already fired and
/// may still sit unread in an inbox.
#[derive(Debug, Default)]
pub struct AlarmBook {
    next_id: u64,
    pending: Vec<Alarm>,
    fired: BTreeMap<AlarmId, (NodeId, MessageId)>,
}

impl AlarmBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alarm that fires after `ticks` steps.
    pub fn set(&mut self, node: NodeId, ticks: i64, mut message: Message) -> SimResult<AlarmId> {
        if ticks <= 0 {
            return Err(SimError::InvalidAlarmTicks { ticks });
        }
        message.meta_header = MetaHeader::Alarm;
        message.destination = Destination::Node(node);

        let id = AlarmId(self.next_id);
        self.next_id += 1;
        debug!(alarm = %id, node = %node, ticks, "alarm set");
        self.pending.push(Alarm {
            id,
            node,
            time_left: ticks,
            message,
        });
        Ok(id)
    }

    /// Count every pending alarm down by one step and push the ones that
    /// reached zero into their node's inbox. Fired alarms whose message has
    /// already been read are forgotten.
    pub fn process(&mut self, network: &mut Network) {
        self.fired.retain(|_, (node, message)| {
            network
                .node(*node)
                .is_ok_and(|n| n.inbox().any(|m| m.id() == *message))
        });
        for alarm in &mut self.pending {
            alarm.time_left -= 1;
        }
        let (due, pending): (Vec<Alarm>, Vec<Alarm>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|alarm| alarm.time_left <= 0);
        self.pending = pending;

        for alarm in due {
            let message_id = alarm.message.id();
            match network.push_to_inbox(alarm.node, alarm.message) {
                Ok(()) => {
                    debug!(alarm = %alarm.id, node = %alarm.node, "alarm fired");
                    self.fired.insert(alarm.id, (alarm.node, message_id));
                }
                Err(e) => warn!(alarm = %alarm.id, error = %e, "alarm target left the network"),
            }
        }
    }

    /// Remove an alarm whether it is pending or already in the inbox.
    /// Returns false when there was nothing to remove.
    pub fn disable(&mut self, network: &mut Network, id: AlarmId) -> bool {
        if let Some(index) = self.pending.iter().position(|alarm| alarm.id == id) {
            self.pending.remove(index);
            return true;
        }
        match self.fired.remove(&id) {
            Some((node, message)) => network
                .node_mut(node)
                .is_ok_and(|n| n.remove_from_inbox(message).is_some()),
            None => false,
        }
    }

    /// Remove every alarm of `node`, pending or delivered but unread.
    pub fn disable_all_for(&mut self, network: &mut Network, node: NodeId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|alarm| alarm.node != node);
        let mut removed = before - self.pending.len();

        let fired: Vec<(AlarmId, MessageId)> = self
            .fired
            .iter()
            .filter(|(_, (owner, _))| *owner == node)
            .map(|(id, (_, message))| (*id, *message))
            .collect();
        for (id, message) in fired {
            self.fired.remove(&id);
            if let Ok(n) = network.node_mut(node) {
                if n.remove_from_inbox(message).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Shift an alarm by `diff` steps. An alarm that fired but is still
    /// unread is pulled back out of the inbox and re-armed. Returns false
    /// when the alarm is unknown or its message was already consumed.
    pub fn update_time(&mut self, network: &mut Network, id: AlarmId, diff: i64) -> bool {
        if let Some(alarm) = self.pending.iter_mut().find(|alarm| alarm.id == id) {
            alarm.time_left += diff;
            return true;
        }
        let Some((node, message_id)) = self.fired.remove(&id) else {
            return false;
        };
        let Some(message) = network
            .node_mut(node)
            .ok()
            .and_then(|n| n.remove_from_inbox(message_id))
        else {
            return false;
        };
        self.pending.push(Alarm {
            id,
            node,
            time_left: diff,
            message,
        });
        true
    }

    /// Alarms still counting down.
    pub fn pending(&self) -> &[Alarm] {
        &self.pending
    }

    pub fn pending_for(&self, node: NodeId) -> impl Iterator<Item = &Alarm> {
        self.pending.iter().filter(move |alarm| alarm.node == node)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.fired.clear();
    }
}
