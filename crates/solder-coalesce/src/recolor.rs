//! The conflict-resolution engine: moving a node to a color may force its
//! interference neighbors to move in turn, several levels deep, and every
//! attempt must either land completely or leave no trace.

use solder_common::{Color, Node};

use crate::cost::{single_candidate, sort_by_cost, ColorCost, INFEASIBLE};
use crate::node::NodeStore;
use crate::Coalescer;

/// The nodes tentatively fixed during one attempt. An attempt either
/// merges its changes into the enclosing one or rolls every one of them
/// back; nothing in between.
#[derive(Debug, Default)]
pub struct ChangeSet {
    nodes: Vec<Node>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Hands every change over to `parent`.
    pub fn merge_into(&mut self, parent: &mut ChangeSet) {
        parent.nodes.append(&mut self.nodes);
    }

    /// Clears the tentative color of every recorded node and empties the
    /// set.
    pub fn rollback(&mut self, nodes: &mut NodeStore) {
        for node in self.nodes.drain(..) {
            nodes.get_mut(node).tentative = None;
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.drain(..)
    }
}

impl Coalescer<'_> {
    /// Tries to make `node` hold `target`, moving conflicting interference
    /// neighbors out of the way as needed. On success every touched node
    /// is recorded in `changed`; on failure nothing is left tentatively
    /// fixed.
    pub(crate) fn change_color(
        &mut self,
        node: Node,
        target: Color,
        changed: &mut ChangeSet,
    ) -> bool {
        let data = self.nodes.get(node);
        let effective = data.effective_color();
        let fixed = data.fixed;
        let claimed = data.tentative.is_some();
        let admissible = data.admissible.contains(&target);

        // Already holding the target: claim it for this attempt.
        if effective == target {
            if !fixed && !claimed {
                self.nodes.get_mut(node).tentative = Some(target);
                changed.record(node);
            }

            return true;
        }

        if fixed || claimed || !admissible {
            return false;
        }

        let costs = single_candidate(self.n_regs, target);
        self.recolor_nodes(node, &costs, changed)
    }

    /// Tries to move `node` anywhere but `exclude`.
    fn change_color_excluded(
        &mut self,
        node: Node,
        exclude: Color,
        changed: &mut ChangeSet,
    ) -> bool {
        let data = self.nodes.get(node);
        let effective = data.effective_color();
        let fixed = data.fixed;
        let claimed = data.tentative.is_some();

        // Already somewhere else: claim the spot for this attempt.
        if effective != exclude {
            if !fixed && !claimed {
                self.nodes.get_mut(node).tentative = Some(effective);
                changed.record(node);
            }

            return true;
        }

        if fixed || claimed {
            return false;
        }

        let mut costs = self.determine_costs(node);
        costs[exclude].cost = INFEASIBLE;
        sort_by_cost(&mut costs);

        self.recolor_nodes(node, &costs, changed)
    }

    /// Walks `costs` cheapest first, tentatively fixing `node` to each
    /// candidate and moving every interference neighbor off that color.
    /// A candidate whose conflicts cannot all be resolved is abandoned
    /// with a full rollback of the local changes; the first candidate
    /// whose conflicts all resolve wins.
    fn recolor_nodes(
        &mut self,
        node: Node,
        costs: &[ColorCost],
        changed: &mut ChangeSet,
    ) -> bool {
        let ifg = self.ifg;
        let mut local = ChangeSet::new();

        for candidate in costs {
            // Candidates are sorted: everything from here on is hopeless.
            if candidate.cost == INFEASIBLE {
                return false;
            }

            let target = candidate.color;

            debug_assert!(
                self.nodes.get(node).tentative.is_none(),
                "node must not be claimed between candidates"
            );
            self.nodes.get_mut(node).tentative = Some(target);
            local.record(node);

            let mut resolved = true;
            for other in ifg.neighbors(node) {
                if self.nodes.get(other).effective_color() != target {
                    continue;
                }

                let mut touched = ChangeSet::new();
                let moved = self.change_color_excluded(other, target, &mut touched);
                touched.merge_into(&mut local);

                if !moved {
                    resolved = false;
                    break;
                }
            }

            if resolved {
                local.merge_into(changed);
                return true;
            }

            local.rollback(&mut self.nodes);
        }

        false
    }
}
