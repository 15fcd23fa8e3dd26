//! Colorings and the checks the rest of the system runs against them.

use std::collections::BTreeMap;

use log::trace;

use crate::{AffinityGraph, Color, Constraints, InterferenceGraph, Node};

/// An assignment of a register to every value in a class.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Coloring {
    colors: BTreeMap<Node, Color>,
}

impl Coloring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node: Node, color: Color) {
        self.colors.insert(node, color);
    }

    pub fn get(&self, node: Node) -> Color {
        *self.colors.get(&node).unwrap()
    }
}

/// Checks that no interfering values share a register and that every value
/// sits in a register admissible for it. Values parked on a reserved
/// register are outside the allocatable class and are skipped.
///
/// Panics on the first violation; a broken coloring is a programming
/// error, not a recoverable condition.
pub fn check_coloring(
    coloring: &Coloring,
    ifg: &InterferenceGraph,
    constraints: &Constraints,
) {
    let mut checked = 0;

    for node in ifg.nodes() {
        let color = coloring.get(node);

        if constraints.is_ignored(color) {
            continue;
        }

        if !constraints.admissible(node).contains(&color) {
            panic!("inconsistency: {node:?} was assigned {color}, which is not admissible for it");
        }

        for other in ifg.neighbors(node) {
            if coloring.get(other) == color {
                panic!(
                    "inconsistency: both {node:?} and {other:?} were assigned {color}, but they interfere"
                );
            }
        }

        checked += 1;
    }

    trace!("coloring of {checked} nodes is consistent");
}

/// The cost of all copies in a program, and of those the coloring failed
/// to eliminate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CopyCosts {
    pub total: u64,
    pub remaining: u64,
}

/// Sums every affinity edge once; an edge whose ends share a register
/// costs nothing.
pub fn copy_costs(aff: &AffinityGraph, coloring: &Coloring) -> CopyCosts {
    let mut costs = CopyCosts::default();

    for node in aff.nodes() {
        for (other, cost) in aff.affinity_neighbors(node) {
            if node < other {
                costs.total += u64::from(cost);

                if coloring.get(node) != coloring.get(other) {
                    costs.remaining += u64::from(cost);
                }
            }
        }
    }

    costs
}
