pub mod coloring;
pub mod constraints;
pub mod graph;

pub use coloring::{check_coloring, copy_costs, Coloring, CopyCosts};
pub use constraints::Constraints;
pub use graph::{AffinityGraph, InterferenceGraph};

/// A value participating in register allocation, identified by its stable
/// index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Node(pub usize);

/// A register index within one register class.
pub type Color = usize;
