//! Communication model: ordering, delay and loss policies applied by the
//! transport layer.
//!
//! Delay and loss are trait objects so a policy can own state (for example
//! a "delay only the first message" policy remembers whether it fired).
//! All randomness is drawn from the network's seeded RNG.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::message::Message;

/// Share of eligible messages swapped in unordered mode unless configured.
pub const DEFAULT_INVERSION_FRACTION: f64 = 0.25;

// ── Transport view ────────────────────────────────────────────────────

/// Network facts a policy may base its decision on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportView {
    pub node_count: usize,
    /// Messages queued in all outboxes when this transport round started.
    pub pending_outbox: usize,
}

// ── Ordering ──────────────────────────────────────────────────────────

/// Per-edge delivery order.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageOrdering {
    /// Ascending id order with head-of-line blocking.
    Ordered,
    /// Eligible messages are delivered in a scrambled order.
    /// `inversion_fraction` of them are swapped at random; at least one
    /// inversion is introduced whenever two or more are eligible.
    Unordered { inversion_fraction: f64 },
}

impl MessageOrdering {
    pub fn unordered() -> Self {
        MessageOrdering::Unordered {
            inversion_fraction: DEFAULT_INVERSION_FRACTION,
        }
    }
}

// ── Delay policies ────────────────────────────────────────────────────

/// Number of transport rounds a message waits before delivery.
///
/// A message is delivered in the round where its countdown reaches zero,
/// so delays of 0 and 1 both deliver in the round the message is picked up.
pub trait DelayPolicy: std::fmt::Debug {
    fn delay(&mut self, view: &TransportView, message: &Message, rng: &mut ChaCha8Rng) -> u32;

    /// Upper bound on any delay this policy hands out, if one exists.
    fn max_delay(&self, view: &TransportView) -> Option<u32>;
}

/// Deliver immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayPolicy for NoDelay {
    fn delay(&mut self, _: &TransportView, _: &Message, _: &mut ChaCha8Rng) -> u32 {
        0
    }

    fn max_delay(&self, _: &TransportView) -> Option<u32> {
        Some(0)
    }
}

/// Delay every message by the number of nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkSizeDelay;

impl DelayPolicy for NetworkSizeDelay {
    fn delay(&mut self, view: &TransportView, _: &Message, _: &mut ChaCha8Rng) -> u32 {
        view.node_count as u32
    }

    fn max_delay(&self, view: &TransportView) -> Option<u32> {
        Some(view.node_count as u32)
    }
}

/// Uniform delay in `0..=node_count`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDelay;

impl DelayPolicy for RandomDelay {
    fn delay(&mut self, view: &TransportView, _: &Message, rng: &mut ChaCha8Rng) -> u32 {
        rng.gen_range(0..=view.node_count as u32)
    }

    fn max_delay(&self, view: &TransportView) -> Option<u32> {
        Some(view.node_count as u32)
    }
}

/// Delay by the average outbox load: 30 queued messages across 10 nodes
/// wait 3 rounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageDelay;

impl DelayPolicy for UsageDelay {
    fn delay(&mut self, view: &TransportView, _: &Message, _: &mut ChaCha8Rng) -> u32 {
        if view.node_count == 0 {
            return 0;
        }
        (view.pending_outbox as f64 / view.node_count as f64).round() as u32
    }

    fn max_delay(&self, _: &TransportView) -> Option<u32> {
        None
    }
}

/// Delay the very first message by `delay`; every later one is immediate.
#[derive(Debug, Clone, Copy)]
pub struct FirstMessageDelay {
    delay: u32,
    fired: bool,
}

impl FirstMessageDelay {
    pub fn new(delay: u32) -> Self {
        FirstMessageDelay { delay, fired: false }
    }
}

impl DelayPolicy for FirstMessageDelay {
    fn delay(&mut self, _: &TransportView, _: &Message, _: &mut ChaCha8Rng) -> u32 {
        if self.fired {
            0
        } else {
            self.fired = true;
            self.delay
        }
    }

    fn max_delay(&self, _: &TransportView) -> Option<u32> {
        Some(self.delay)
    }
}

// ── Loss policies ─────────────────────────────────────────────────────

/// Decides whether a message disappears in transit.
pub trait LossPolicy: std::fmt::Debug {
    fn is_lost(&mut self, view: &TransportView, message: &Message, rng: &mut ChaCha8Rng) -> bool;

    /// True when this policy never drops anything.
    fn is_lossless(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoss;

impl LossPolicy for NoLoss {
    fn is_lost(&mut self, _: &TransportView, _: &Message, _: &mut ChaCha8Rng) -> bool {
        false
    }

    fn is_lossless(&self) -> bool {
        true
    }
}

/// Drop each message independently with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomLoss {
    probability: f64,
}

impl RandomLoss {
    pub fn new(probability: f64) -> Self {
        RandomLoss {
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

impl LossPolicy for RandomLoss {
    fn is_lost(&mut self, _: &TransportView, _: &Message, rng: &mut ChaCha8Rng) -> bool {
        rng.gen::<f64>() < self.probability
    }

    fn is_lossless(&self) -> bool {
        self.probability <= 0.0
    }
}

// ── Communication model ───────────────────────────────────────────────

/// Ordering, delay and loss for one network.
#[derive(Debug)]
pub struct CommunicationModel {
    pub ordering: MessageOrdering,
    pub delay: Box<dyn DelayPolicy>,
    pub loss: Box<dyn LossPolicy>,
}

impl CommunicationModel {
    pub fn new(
        ordering: MessageOrdering,
        delay: impl DelayPolicy + 'static,
        loss: impl LossPolicy + 'static,
    ) -> Self {
        CommunicationModel {
            ordering,
            delay: Box::new(delay),
            loss: Box::new(loss),
        }
    }

    /// Ordered, no delay, no loss.
    pub fn ideal() -> Self {
        Self::new(MessageOrdering::Ordered, NoDelay, NoLoss)
    }

    /// Unordered, no delay, no loss.
    pub fn unordered() -> Self {
        Self::new(MessageOrdering::unordered(), NoDelay, NoLoss)
    }

    /// Ordered, delayed by network usage.
    pub fn throttled() -> Self {
        Self::new(MessageOrdering::Ordered, UsageDelay, NoLoss)
    }

    pub fn unordered_throttled() -> Self {
        Self::new(MessageOrdering::unordered(), UsageDelay, NoLoss)
    }

    /// Ordered, random delay bounded by the network size.
    pub fn random_delay() -> Self {
        Self::new(MessageOrdering::Ordered, RandomDelay, NoLoss)
    }

    pub fn unordered_random_delay() -> Self {
        Self::new(MessageOrdering::unordered(), RandomDelay, NoLoss)
    }

    /// Ordered, 10% loss.
    pub fn unlikely_random_loss() -> Self {
        Self::new(MessageOrdering::Ordered, NoDelay, RandomLoss::new(0.1))
    }

    /// Ordered, 90% loss.
    pub fn likely_random_loss() -> Self {
        Self::new(MessageOrdering::Ordered, NoDelay, RandomLoss::new(0.9))
    }

    #[inline]
    pub fn is_ordered(&self) -> bool {
        matches!(self.ordering, MessageOrdering::Ordered)
    }

    /// Builder: replace the ordering policy.
    pub fn with_ordering(mut self, ordering: MessageOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Delivery order for `n` eligible messages already sorted by id.
    ///
    /// Ordered mode returns the identity. Unordered mode applies random
    /// swaps and guarantees the result is not the identity when `n >= 2`.
    pub(crate) fn delivery_order(&self, n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        let MessageOrdering::Unordered { inversion_fraction } = self.ordering else {
            return order;
        };
        if n < 2 {
            return order;
        }
        let swaps = ((n as f64 * inversion_fraction).floor() as usize).max(1);
        for _ in 0..swaps {
            let i = rng.gen_range(0..n - 1);
            let j = rng.gen_range(i + 1..n);
            order.swap(i, j);
        }
        if order.iter().enumerate().all(|(pos, &idx)| pos == idx) {
            let k = rng.gen_range(0..n - 1);
            order.swap(k, k + 1);
        }
        order
    }
}

impl Default for CommunicationModel {
    fn default() -> Self {
        Self::unordered()
    }
}
