//! Colors one chunk at a time: every usable color gets a trial run, the
//! best reachable fragment wins and is committed, and whatever is left of
//! the chunk goes back into the queue.

use std::collections::{BTreeSet, VecDeque};

use log::trace;
use solder_common::{Color, Node};

use crate::chunk::{ChunkId, QueueEntry};
use crate::recolor::ChangeSet;
use crate::Coalescer;

/// Membership test used while growing a fragment.
#[derive(Clone, Copy, Debug)]
enum Accept {
    HasColor(Color),
    HasNotColor(Color),
    Always,
}

impl Accept {
    fn test(&self, color: Color) -> bool {
        match self {
            Accept::HasColor(wanted) => color == *wanted,
            Accept::HasNotColor(unwanted) => color != *unwanted,
            Accept::Always => true,
        }
    }
}

impl Coalescer<'_> {
    /// Tries every usable color on `chunk` and commits the best achievable
    /// fragment; whatever remains is requeued as new chunks. If no color
    /// applies to any member, the chunk is discarded and its members keep
    /// the colors they already had.
    pub(crate) fn color_chunk(&mut self, chunk: ChunkId) {
        let members: Vec<Node> = self.chunks.get(chunk).members.iter().copied().collect();
        trace!("coloring a chunk of {} nodes", members.len());

        let mut best: Option<(ChunkId, Color)> = None;
        let mut trials: Vec<ChunkId> = Vec::new();
        let mut changed = ChangeSet::new();

        for color in 0..self.k {
            // Seed the trial from the first uncommitted member that accepts
            // the color. Members committed by an earlier chunk's displaced
            // neighbors no longer speak for this one.
            let mut seeded = false;
            for &node in &members {
                if self.nodes.get(node).fixed {
                    continue;
                }

                if self.change_color(node, color, &mut changed) {
                    seeded = true;
                    break;
                }
            }

            if !seeded {
                continue;
            }

            // See how much of the chunk now hangs together under this
            // color, and whether that beats the colors tried before.
            let local_best = self.fragment_chunk(color, chunk, &mut trials);
            let local_weight = self.chunk_weight(local_best);

            let better = match best {
                Some((current, _)) => self.chunk_weight(current) < local_weight,
                None => true,
            };

            if better {
                best = Some((local_best, color));
            }

            // The trial was exploratory; revert it and hand the members
            // back to the original chunk.
            changed.rollback(&mut self.nodes);
            for &node in &members {
                self.nodes.get_mut(node).chunk = Some(chunk);
            }
        }

        // Everything except the winner was scaffolding.
        let winner = best.map(|(id, _)| id);
        for trial in trials {
            if Some(trial) != winner {
                self.chunks.delete(trial);
            }
        }

        match best {
            Some((winner, color)) => self.commit_fragment(chunk, winner, color, &mut changed),
            None => {
                trace!("no color applies, chunk dropped");
                self.chunks.delete(chunk);
            }
        }
    }

    /// Makes the winning trial permanent: every member of `winner` takes
    /// `color`, every node displaced along the way keeps its displaced
    /// spot, and all of them are fixed for good. The rest of `original`
    /// is split into connected pieces and requeued.
    fn commit_fragment(
        &mut self,
        original: ChunkId,
        winner: ChunkId,
        color: Color,
        changed: &mut ChangeSet,
    ) {
        let fragment: Vec<Node> = self.chunks.get(winner).members.iter().copied().collect();
        trace!("committing {} nodes to color {}", fragment.len(), color);

        for &node in &fragment {
            let applied = self.change_color(node, color, changed);
            assert!(applied, "winning color no longer applies to {node:?}");

            let data = self.nodes.get_mut(node);
            data.fixed = true;
            data.color = color;
            data.tentative = None;
            data.chunk = Some(winner);
        }

        for node in changed.drain() {
            let data = self.nodes.get_mut(node);
            data.fixed = true;

            if let Some(color) = data.tentative.take() {
                data.color = color;
            }
        }

        // Strip the committed nodes out and requeue whatever still hangs
        // together of the remainder.
        let fragment: BTreeSet<Node> = fragment.into_iter().collect();
        self.chunks.get_mut(original).remove_all(&fragment);

        let mut visited = fragment;
        let remainder: Vec<Node> = self.chunks.get(original).members.iter().copied().collect();

        for node in remainder {
            if visited.contains(&node) {
                continue;
            }

            let piece = self.chunks.create();
            self.expand_from(node, &mut visited, piece, original, Accept::Always);

            let weight = self.chunk_weight(piece);
            self.queue.push(QueueEntry { weight, id: piece });
        }

        self.chunks.delete(original);
        self.chunks.delete(winner);
    }

    /// Splits `chunk` into connected components of nodes holding `color`
    /// and nodes avoiding it, returning the heaviest color-holding one.
    /// Every component is appended to `out`; the caller decides which to
    /// keep.
    fn fragment_chunk(&mut self, color: Color, chunk: ChunkId, out: &mut Vec<ChunkId>) -> ChunkId {
        let members: Vec<Node> = self.chunks.get(chunk).members.iter().copied().collect();
        let mut visited: BTreeSet<Node> = BTreeSet::new();
        let mut best: Option<(ChunkId, f64)> = None;

        for node in members {
            if visited.contains(&node) {
                continue;
            }

            let holds_color = self.nodes.get(node).effective_color() == color;
            let accept = if holds_color {
                Accept::HasColor(color)
            } else {
                Accept::HasNotColor(color)
            };

            let piece = self.chunks.create();
            out.push(piece);
            self.expand_from(node, &mut visited, piece, chunk, accept);

            if !holds_color {
                continue;
            }

            let weight = self.chunk_weight(piece);
            match best {
                Some((_, best_weight)) if best_weight >= weight => {}
                _ => best = Some((piece, weight)),
            }
        }

        let (best, _) = best.expect("the seeded color is held by at least one member");
        best
    }

    /// Grows a fragment from `start` along affinity edges, taking only
    /// unvisited, unfixed members of `origin` that pass `accept` and whose
    /// current chunk does not interfere with the growing one.
    fn expand_from(
        &mut self,
        start: Node,
        visited: &mut BTreeSet<Node>,
        into: ChunkId,
        origin: ChunkId,
        accept: Accept,
    ) {
        let aff = self.aff;
        let mut frontier = VecDeque::new();

        visited.insert(start);
        self.add_to_chunk(into, start);
        frontier.push_back(start);

        while let Some(node) = frontier.pop_front() {
            for (other, _) in aff.affinity_neighbors(node) {
                if visited.contains(&other) || self.nodes.is_reserved(other) {
                    continue;
                }

                if !self.chunks.get(origin).members.contains(&other) {
                    continue;
                }

                let data = self.nodes.get(other);
                if data.fixed || !accept.test(data.effective_color()) {
                    continue;
                }

                if let Some(home) = data.chunk {
                    if self.chunks_interfere(into, home) {
                        continue;
                    }
                }

                visited.insert(other);
                self.add_to_chunk(into, other);
                frontier.push_back(other);
            }
        }
    }
}
