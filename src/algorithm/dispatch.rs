//! Handler table mapping `(status, action)` to a handler function.

use std::collections::BTreeMap;

use crate::error::SimResult;
use crate::message::Message;

use super::context::NodeContext;
use super::node_algorithm::NodeAlgorithm;
use super::status::{Action, StatusValue};

/// A status handler.
pub type Handler<A> = fn(&mut A, &mut NodeContext<'_>, Message) -> SimResult<()>;

/// Built once per algorithm type by [`NodeAlgorithm::handlers`].
///
/// Resolution tries `(status, action)` first and falls back to
/// `(status, Action::Default)`.
pub struct DispatchTable<A: NodeAlgorithm> {
    handlers: BTreeMap<(A::Status, Action), Handler<A>>,
}

impl<A: NodeAlgorithm> DispatchTable<A> {
    pub fn new() -> Self {
        DispatchTable {
            handlers: BTreeMap::new(),
        }
    }

    /// Builder: register `handler` for `action` in `status`.
    pub fn on(mut self, status: A::Status, action: Action, handler: Handler<A>) -> Self {
        self.handlers.insert((status, action), handler);
        self
    }

    /// Builder: register one handler for `action` in several statuses.
    pub fn on_each(mut self, statuses: &[A::Status], action: Action, handler: Handler<A>) -> Self {
        for status in statuses {
            self.handlers.insert((*status, action), handler);
        }
        self
    }

    pub fn resolve(&self, status: A::Status, action: Action) -> Option<Handler<A>> {
        self.handlers
            .get(&(status, action))
            .or_else(|| self.handlers.get(&(status, Action::Default)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<A: NodeAlgorithm> Default for DispatchTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: NodeAlgorithm> std::fmt::Debug for DispatchTable<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.handlers
                    .keys()
                    .map(|(status, action)| format!("{}_{}", action, status.name())),
            )
            .finish()
    }
}
