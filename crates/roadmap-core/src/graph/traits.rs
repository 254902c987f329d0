use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Opaque identifier of a node in a dependency graph
///
/// The engine never creates nodes; it only needs to hash, order, and print
/// the identifiers handed to it. Blanket-implemented for every type that
/// satisfies the bounds (e.g. `Uuid`, integers, `&str`).
pub trait NodeId: Copy + Eq + Hash + Ord + Debug + Display {}

impl<T> NodeId for T where T: Copy + Eq + Hash + Ord + Debug + Display {}

/// Trait for entities that can participate in a graph
///
/// Implemented by work items (epics and tasks).
pub trait GraphNode {
    type Id: NodeId;

    /// Get the unique identifier for this node
    fn node_id(&self) -> Self::Id;
}
