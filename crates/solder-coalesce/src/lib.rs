//! Copy coalescing over an existing register allocation: values connected
//! by copies are clustered into chunks, and the heaviest chunks get first
//! pick at moving into a shared register, without ever breaking the
//! legality of the coloring they started from.

mod build;
mod chunk;
mod color;
mod cost;
mod node;
mod recolor;

#[cfg(test)]
mod tests;

use std::collections::BinaryHeap;

use log::{debug, info, trace};

use solder_common::{
    check_coloring, copy_costs, AffinityGraph, Coloring, Constraints, InterferenceGraph,
};

use chunk::{ChunkId, ChunkSet, QueueEntry};
use node::NodeStore;

/// Rewrites `initial` to eliminate as much copy cost as the chunk
/// heuristic can find, and returns the refined coloring. The input
/// coloring must already be legal; the output always is.
pub fn coalesce(
    ifg: &InterferenceGraph,
    aff: &AffinityGraph,
    constraints: &Constraints,
    initial: &Coloring,
) -> Coloring {
    info!("beginning copy coalescing");

    let mut coalescer = Coalescer::new(ifg, aff, constraints, initial);
    coalescer.build_chunks();

    while let Some(chunk) = coalescer.pop_chunk() {
        coalescer.color_chunk(chunk);
    }

    let coloring = coalescer.into_coloring();

    if cfg!(debug_assertions) {
        check_coloring(&coloring, ifg, constraints);
    }

    let before = copy_costs(aff, initial);
    let after = copy_costs(aff, &coloring);
    debug!(
        "copy costs {} -> {} (of {} total)",
        before.remaining, after.remaining, after.total
    );

    trace!("done copy coalescing");

    coloring
}

pub(crate) struct Coalescer<'a> {
    n_regs: usize,
    k: usize,

    ifg: &'a InterferenceGraph,
    aff: &'a AffinityGraph,

    nodes: NodeStore<'a>,
    chunks: ChunkSet,
    queue: BinaryHeap<QueueEntry>,
}

impl<'a> Coalescer<'a> {
    pub(crate) fn new(
        ifg: &'a InterferenceGraph,
        aff: &'a AffinityGraph,
        constraints: &'a Constraints,
        initial: &'a Coloring,
    ) -> Self {
        Self {
            n_regs: constraints.n_regs(),
            k: constraints.usable(),
            ifg,
            aff,
            nodes: NodeStore::new(ifg, constraints, initial),
            chunks: ChunkSet::default(),
            queue: BinaryHeap::new(),
        }
    }

    /// Pops the heaviest live chunk. Entries whose chunk has since been
    /// absorbed, committed, or discarded are stale and skipped.
    pub(crate) fn pop_chunk(&mut self) -> Option<ChunkId> {
        while let Some(entry) = self.queue.pop() {
            if self.chunks.is_live(entry.id) {
                return Some(entry.id);
            }
        }

        None
    }

    pub(crate) fn into_coloring(self) -> Coloring {
        self.nodes.into_coloring()
    }
}
