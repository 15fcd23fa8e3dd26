//! Scores every color for a node: how much taking it would please the
//! node's affinity neighbors and upset its interference neighbors.

use solder_common::{Color, Node};

use crate::Coalescer;

/// Cost of a color that must never be chosen.
pub const INFEASIBLE: f64 = f64::INFINITY;

/// Reward for matching the color of an affinity neighbor whose own color
/// is already settled.
const AFFINITY_FIX_BONUS: f64 = 128.0;

/// Price of taking the current color of a constrained, unsettled
/// interference neighbor.
const CONSTRAINT_PENALTY: f64 = 64.0;

/// The desirability of one color for one node; lower is better.
#[derive(Clone, Copy, Debug)]
pub struct ColorCost {
    pub color: Color,
    pub cost: f64,
}

/// Sorts candidates cheapest first. The sort is stable, so equally cheap
/// colors keep ascending index order.
pub fn sort_by_cost(costs: &mut [ColorCost]) {
    costs.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

/// A candidate vector admitting only `color`: it costs nothing, every
/// other color is infeasible.
pub fn single_candidate(n_regs: usize, color: Color) -> Vec<ColorCost> {
    let mut costs = Vec::with_capacity(n_regs);
    costs.push(ColorCost { color, cost: 0.0 });

    costs.extend((0..n_regs).filter(|other| *other != color).map(|other| ColorCost {
        color: other,
        cost: INFEASIBLE,
    }));

    costs
}

impl Coalescer<'_> {
    /// The full cost vector for `node`, indexed by color and unsorted:
    /// bonuses for the colors of settled affinity neighbors, infeasibility
    /// for the colors of settled interference neighbors and for anything
    /// outside the node's admissible set, and penalties for evicting
    /// constrained unsettled neighbors from their current color.
    pub(crate) fn determine_costs(&mut self, node: Node) -> Vec<ColorCost> {
        let aff = self.aff;
        let ifg = self.ifg;

        let mut costs: Vec<ColorCost> = (0..self.n_regs)
            .map(|color| ColorCost { color, cost: 0.0 })
            .collect();

        for (other, cost) in aff.affinity_neighbors(node) {
            let data = self.nodes.get(other);

            if data.settled() {
                costs[data.effective_color()].cost -= f64::from(cost) * AFFINITY_FIX_BONUS;
            }
        }

        for other in ifg.neighbors(node) {
            let data = self.nodes.get(other);
            let color = data.effective_color();

            if data.settled() {
                costs[color].cost = INFEASIBLE;
            } else if data.admissible.len() < self.k {
                let ratio = 1.0 - data.admissible.len() as f64 / self.k as f64;
                costs[color].cost += ratio * CONSTRAINT_PENALTY;
            }
        }

        let admissible = self.nodes.get(node).admissible.clone();
        for entry in costs.iter_mut() {
            if !admissible.contains(&entry.color) {
                entry.cost = INFEASIBLE;
            }
        }

        costs
    }
}
