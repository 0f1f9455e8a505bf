//! Adjacency queries over the network's edge set.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::node::NodeId;

use super::Network;

impl Network {
    /// Out-neighbours of `id` in ascending order. Empty for unknown nodes.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.adjacency
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Nodes with an edge into `id`.
    pub fn in_neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.adjacency
            .iter()
            .filter(|(_, out)| out.contains(&id))
            .map(|(from, _)| *from)
            .collect()
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.adjacency.get(&from).is_some_and(|out| out.contains(&to))
    }

    /// Edge list. An undirected edge is listed once, smaller id first.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.adjacency
            .iter()
            .flat_map(|(from, out)| out.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| self.is_directed() || from < to)
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    /// Out-degree.
    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeSet::len)
    }

    pub fn avg_degree(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let total: usize = self.adjacency.values().map(BTreeSet::len).sum();
        total as f64 / self.len() as f64
    }

    /// Connected when undirected, strongly connected when directed.
    /// The empty network counts as connected.
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.adjacency.keys().next().copied() else {
            return true;
        };
        if self.reachable_from(start, &self.adjacency).len() != self.len() {
            return false;
        }
        if !self.is_directed() {
            return true;
        }
        let reversed = self.reversed_adjacency();
        self.reachable_from(start, &reversed).len() == self.len()
    }

    /// Components of the underlying undirected graph, each sorted, ordered
    /// by their smallest id.
    pub fn weak_components(&self) -> Vec<Vec<NodeId>> {
        let undirected = self.undirected_adjacency();
        let mut seen = BTreeSet::new();
        let mut components = Vec::new();
        for id in undirected.keys() {
            if seen.contains(id) {
                continue;
            }
            let component = self.reachable_from(*id, &undirected);
            seen.extend(component.iter().copied());
            components.push(component.into_iter().collect());
        }
        components
    }

    /// Whether every edge has a partner in the opposite direction.
    pub fn is_reciprocal(&self) -> bool {
        self.adjacency
            .iter()
            .all(|(from, out)| out.iter().all(|to| self.has_edge(*to, *from)))
    }

    fn reachable_from(
        &self,
        start: NodeId,
        adjacency: &BTreeMap<NodeId, BTreeSet<NodeId>>,
    ) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in adjacency.get(&current).into_iter().flatten() {
                if seen.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
        seen
    }

    fn reversed_adjacency(&self) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
        let mut reversed: BTreeMap<NodeId, BTreeSet<NodeId>> =
            self.adjacency.keys().map(|id| (*id, BTreeSet::new())).collect();
        for (from, out) in &self.adjacency {
            for to in out {
                reversed.entry(*to).or_default().insert(*from);
            }
        }
        reversed
    }

    pub(crate) fn undirected_adjacency(&self) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
        let mut undirected = self.adjacency.clone();
        for (from, out) in &self.adjacency {
            for to in out {
                undirected.entry(*to).or_default().insert(*from);
            }
        }
        undirected
    }
}
