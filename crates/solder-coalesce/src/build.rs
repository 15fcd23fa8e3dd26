//! Builds the initial chunks: affinity edges are taken heaviest first and
//! the chunks at their ends merged whenever no interference crosses them.

use log::debug;
use solder_common::Node;

use crate::chunk::{ChunkId, QueueEntry};
use crate::Coalescer;

/// A copy between two values, discounted by how much interference
/// pressure its ends are under.
#[derive(Clone, Copy, Debug)]
struct AffinityEdge {
    src: Node,
    tgt: Node,
    weight: f64,
}

impl Coalescer<'_> {
    pub(crate) fn build_chunks(&mut self) {
        let aff = self.aff;
        let mut edges = Vec::new();

        for node in aff.nodes() {
            if self.nodes.is_reserved(node) {
                continue;
            }

            for (other, cost) in aff.affinity_neighbors(node) {
                // Count each edge once, from its lower end. Free copies
                // carry no incentive and are left out.
                if other <= node || cost == 0 || self.nodes.is_reserved(other) {
                    continue;
                }

                edges.push(AffinityEdge {
                    src: node,
                    tgt: other,
                    weight: self.damped_weight(node, other, cost),
                });
            }
        }

        // Heaviest first; equal weights settle on the lower index pair.
        edges.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| (a.src, a.tgt).cmp(&(b.src, b.tgt)))
        });

        debug!("{} affinity edges", edges.len());

        for edge in edges {
            let src_chunk = self.chunk_of(edge.src);
            let tgt_chunk = self.chunk_of(edge.tgt);

            if src_chunk != tgt_chunk {
                self.absorb(src_chunk, tgt_chunk);
            }
        }

        let chunks: Vec<ChunkId> = self.chunks.ids().collect();
        for &chunk in chunks.iter() {
            let weight = self.chunk_weight(chunk);
            self.queue.push(QueueEntry { weight, id: chunk });
        }

        debug!("{} affinity chunks built", chunks.len());
    }

    /// The chunk holding `node`, creating a singleton if it has none yet.
    fn chunk_of(&mut self, node: Node) -> ChunkId {
        if let Some(chunk) = self.nodes.get(node).chunk {
            return chunk;
        }

        let chunk = self.chunks.create();
        self.add_to_chunk(chunk, node);
        chunk
    }

    /// Merges `absorbed` into `chunk`, unless an interference edge crosses
    /// between them.
    fn absorb(&mut self, chunk: ChunkId, absorbed: ChunkId) -> bool {
        if self.chunks_interfere(chunk, absorbed) {
            return false;
        }

        let members = std::mem::take(&mut self.chunks.get_mut(absorbed).members);
        for &node in &members {
            self.nodes.get_mut(node).chunk = Some(chunk);
        }

        let target = self.chunks.get_mut(chunk);
        for node in members {
            target.add(node);
        }

        self.chunks.delete(absorbed);
        true
    }

    /// Puts `node` into `chunk` and points its backlink there.
    pub(crate) fn add_to_chunk(&mut self, chunk: ChunkId, node: Node) {
        self.chunks.get_mut(chunk).add(node);
        self.nodes.get_mut(node).chunk = Some(chunk);
    }

    /// Whether any interference edge crosses from `a` into `b`.
    pub(crate) fn chunks_interfere(&self, a: ChunkId, b: ChunkId) -> bool {
        let others = &self.chunks.get(b).members;

        self.chunks
            .get(a)
            .members
            .iter()
            .any(|&node| self.ifg.neighbors(node).any(|other| others.contains(&other)))
    }

    /// The chunk's aggregate desirability, recomputed if stale: the damped
    /// weight of every affinity edge running from a member towards a
    /// higher-indexed value.
    pub(crate) fn chunk_weight(&mut self, chunk: ChunkId) -> f64 {
        if let Some(weight) = self.chunks.get(chunk).cached_weight() {
            return weight;
        }

        let aff = self.aff;
        let members: Vec<Node> = self.chunks.get(chunk).members.iter().copied().collect();
        let mut weight = 0.0;

        for &node in &members {
            for (other, cost) in aff.affinity_neighbors(node) {
                if node < other && !self.nodes.is_reserved(other) {
                    weight += self.damped_weight(node, other, cost);
                }
            }
        }

        self.chunks.get_mut(chunk).set_weight(weight);
        weight
    }

    /// A copy's weight after discounting for the interference pressure at
    /// both of its ends.
    fn damped_weight(&mut self, a: Node, b: Node, cost: u32) -> f64 {
        let degrees = self.nodes.get(a).degree + self.nodes.get(b).degree;
        f64::from(cost) / (1 + degrees) as f64
    }
}
