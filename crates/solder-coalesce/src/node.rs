use std::collections::{BTreeMap, BTreeSet};

use solder_common::{Color, Coloring, Constraints, InterferenceGraph, Node};

use crate::chunk::ChunkId;

/// Coalescing state for one value. Created the first time the value is
/// touched and kept for the rest of the pass.
#[derive(Clone, Debug)]
pub struct CoalescingNode {
    /// The chunk currently holding this node, if any.
    pub chunk: Option<ChunkId>,

    /// The registers this value may legally occupy.
    pub admissible: BTreeSet<Color>,

    /// How many unreserved values this one interferes with. Only used to
    /// damp affinity edge weights; never updated after creation.
    pub degree: usize,

    /// The register currently assigned.
    pub color: Color,

    /// A provisional register held for the duration of one trial. `Some`
    /// also marks the node as claimed by the running attempt.
    pub tentative: Option<Color>,

    /// Once set, the color never changes again.
    pub fixed: bool,
}

impl CoalescingNode {
    /// The color the rest of the pass should see: the tentative one while
    /// a trial holds the node, the assigned one otherwise.
    pub fn effective_color(&self) -> Color {
        self.tentative.unwrap_or(self.color)
    }

    /// Whether the node's color is already decided, permanently or for the
    /// duration of the running trial.
    pub fn settled(&self) -> bool {
        self.fixed || self.tentative.is_some()
    }
}

/// Per-value coalescing state, populated lazily from the inputs.
pub struct NodeStore<'a> {
    ifg: &'a InterferenceGraph,
    constraints: &'a Constraints,
    initial: &'a Coloring,

    nodes: BTreeMap<Node, CoalescingNode>,
}

impl<'a> NodeStore<'a> {
    pub fn new(
        ifg: &'a InterferenceGraph,
        constraints: &'a Constraints,
        initial: &'a Coloring,
    ) -> Self {
        Self {
            ifg,
            constraints,
            initial,
            nodes: BTreeMap::new(),
        }
    }

    /// Whether `node` is parked on a unit-wide reserved register. Such
    /// values never move, never form affinity edges, and do not count
    /// towards interference degrees.
    pub fn is_reserved(&self, node: Node) -> bool {
        self.constraints.is_ignored(self.initial.get(node))
    }

    pub fn get(&mut self, node: Node) -> &CoalescingNode {
        self.ensure(node);
        &self.nodes[&node]
    }

    pub fn get_mut(&mut self, node: Node) -> &mut CoalescingNode {
        self.ensure(node);
        self.nodes.get_mut(&node).unwrap()
    }

    fn ensure(&mut self, node: Node) {
        if self.nodes.contains_key(&node) {
            return;
        }

        let degree = self
            .ifg
            .neighbors(node)
            .filter(|other| !self.is_reserved(*other))
            .count();

        self.nodes.insert(
            node,
            CoalescingNode {
                chunk: None,
                admissible: self.constraints.admissible(node),
                degree,
                color: self.initial.get(node),
                tentative: None,
                fixed: false,
            },
        );
    }

    /// The original coloring with every touched value's final color laid
    /// over it.
    pub fn into_coloring(self) -> Coloring {
        let mut coloring = self.initial.clone();

        for (node, data) in self.nodes {
            coloring.set(node, data.color);
        }

        coloring
    }
}
