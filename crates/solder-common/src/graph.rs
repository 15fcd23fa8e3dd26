use std::collections::{BTreeMap, BTreeSet};

use crate::Node;

/// Which values are live at the same time and therefore must never share a
/// register. Symmetric and irreflexive.
#[derive(Clone, Debug, Default)]
pub struct InterferenceGraph {
    adjacency: BTreeMap<Node, BTreeSet<Node>>,
}

impl InterferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.adjacency.entry(node).or_default();
    }

    pub fn add_edge(&mut self, a: Node, b: Node) {
        assert_ne!(a, b, "a value cannot interfere with itself");
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn neighbors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.adjacency.get(&node).into_iter().flatten().copied()
    }
}

/// Which values are connected by copies, and how expensive each copy is.
/// Coloring both ends of an edge the same eliminates that cost.
#[derive(Clone, Debug, Default)]
pub struct AffinityGraph {
    neighbors: BTreeMap<Node, Vec<(Node, u32)>>,
}

impl AffinityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a copy between `a` and `b`; the edge is visible from both
    /// ends.
    pub fn add_affinity(&mut self, a: Node, b: Node, cost: u32) {
        assert_ne!(a, b, "a value has no affinity with itself");
        self.neighbors.entry(a).or_default().push((b, cost));
        self.neighbors.entry(b).or_default().push((a, cost));
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.neighbors.keys().copied()
    }

    pub fn affinity_neighbors(&self, node: Node) -> impl Iterator<Item = (Node, u32)> + '_ {
        self.neighbors.get(&node).into_iter().flatten().copied()
    }
}
