use std::collections::{BTreeMap, BTreeSet};

use crate::{Color, Node};

/// Register-class constraints, handed to the pass when it is constructed:
/// the class size, the registers reserved across the whole unit, and any
/// per-value limited register sets.
#[derive(Clone, Debug)]
pub struct Constraints {
    n_regs: usize,
    ignored: BTreeSet<Color>,
    limited: BTreeMap<Node, BTreeSet<Color>>,
}

impl Constraints {
    pub fn new(n_regs: usize) -> Self {
        Self {
            n_regs,
            ignored: BTreeSet::new(),
            limited: BTreeMap::new(),
        }
    }

    /// Reserves a register for the whole unit (a stack or frame pointer,
    /// say). No value is ever moved to or from it.
    pub fn ignore(&mut self, color: Color) {
        assert!(color < self.n_regs, "no such register: {color}");
        self.ignored.insert(color);
    }

    /// Restricts `node` to the given registers.
    pub fn limit(&mut self, node: Node, colors: impl IntoIterator<Item = Color>) {
        let colors: BTreeSet<Color> = colors.into_iter().collect();
        assert!(
            colors.iter().all(|color| *color < self.n_regs),
            "limited set of {node:?} names a register outside the class"
        );
        self.limited.insert(node, colors);
    }

    pub fn n_regs(&self) -> usize {
        self.n_regs
    }

    /// The number of usable registers in the class.
    pub fn usable(&self) -> usize {
        self.n_regs - self.ignored.len()
    }

    pub fn is_ignored(&self, color: Color) -> bool {
        self.ignored.contains(&color)
    }

    /// The registers `node` may legally occupy: its limited set, or the
    /// whole class, minus the reserved registers.
    pub fn admissible(&self, node: Node) -> BTreeSet<Color> {
        match self.limited.get(&node) {
            Some(limited) => limited.difference(&self.ignored).copied().collect(),
            None => (0..self.n_regs)
                .filter(|color| !self.ignored.contains(color))
                .collect(),
        }
    }
}
