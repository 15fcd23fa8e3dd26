use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use solder_common::Node;

/// Handle to a chunk in the [`ChunkSet`]. Ids are never reused, so a
/// handle that outlives its chunk is detectably stale.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChunkId(usize);

/// A set of values believed worth moving into one register together. Its
/// weight is cached and recomputed whenever the membership has changed.
#[derive(Clone, Debug, Default)]
pub struct AffinityChunk {
    pub members: BTreeSet<Node>,
    weight: f64,
    weight_valid: bool,
}

impl AffinityChunk {
    pub fn add(&mut self, node: Node) {
        self.members.insert(node);
        self.weight_valid = false;
    }

    pub fn remove_all(&mut self, nodes: &BTreeSet<Node>) {
        for node in nodes {
            self.members.remove(node);
        }

        self.weight_valid = false;
    }

    pub fn cached_weight(&self) -> Option<f64> {
        self.weight_valid.then_some(self.weight)
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
        self.weight_valid = true;
    }
}

/// Owner of every live chunk. Chunks die when absorbed into another chunk,
/// fully committed, or discarded.
#[derive(Debug, Default)]
pub struct ChunkSet {
    chunks: BTreeMap<ChunkId, AffinityChunk>,
    next: usize,
}

impl ChunkSet {
    pub fn create(&mut self) -> ChunkId {
        let id = ChunkId(self.next);
        self.next += 1;
        self.chunks.insert(id, AffinityChunk::default());
        id
    }

    pub fn delete(&mut self, id: ChunkId) {
        self.chunks.remove(&id);
    }

    pub fn is_live(&self, id: ChunkId) -> bool {
        self.chunks.contains_key(&id)
    }

    pub fn get(&self, id: ChunkId) -> &AffinityChunk {
        self.chunks.get(&id).unwrap()
    }

    pub fn get_mut(&mut self, id: ChunkId) -> &mut AffinityChunk {
        self.chunks.get_mut(&id).unwrap()
    }

    pub fn ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.chunks.keys().copied()
    }
}

/// A non-owning queue entry: heavier chunks first, older chunks on equal
/// weight. Entries for chunks that have since died are skipped when
/// popped.
#[derive(Clone, Copy, Debug)]
pub struct QueueEntry {
    pub weight: f64,
    pub id: ChunkId,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}
