use serde::{Deserialize, Serialize};

use super::traits::NodeId;

/// A "depends on" relationship: `from` depends on `to`
///
/// Edges are scoped by the caller to one project and one item kind;
/// the edge itself only carries the two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge<N> {
    /// The dependent node
    pub from: N,
    /// The dependency
    pub to: N,
}

impl<N: NodeId> Edge<N> {
    pub fn new(from: N, to: N) -> Self {
        Self { from, to }
    }

    /// Check if this edge involves a given node (either endpoint)
    pub fn involves(&self, node: N) -> bool {
        self.from == node || self.to == node
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl<N: NodeId> From<(N, N)> for Edge<N> {
    fn from((from, to): (N, N)) -> Self {
        Self::new(from, to)
    }
}
