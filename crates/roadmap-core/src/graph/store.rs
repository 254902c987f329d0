use std::collections::{BTreeSet, HashMap, HashSet};

use super::algorithms::{self, Adjacency};
use super::edge::Edge;
use super::traits::NodeId;

/// Read-only index over one snapshot of "depends on" edges
///
/// Built once per call from the flat edge list of a single project and
/// item kind. Keeps both directions so dependency and dependent lookups
/// are hash lookups. Duplicate pairs in the input collapse into one edge.
#[derive(Debug, Clone)]
pub struct EdgeStore<N> {
    forward: Adjacency<N>,
    reverse: Adjacency<N>,
    edge_count: usize,
}

impl<N: NodeId> Default for EdgeStore<N> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
            edge_count: 0,
        }
    }
}

impl<N: NodeId> EdgeStore<N> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build both adjacency maps from a flat edge list in O(E)
    pub fn load<I, E>(edges: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Edge<N>>,
    {
        let mut store = Self::new();
        for edge in edges {
            let Edge { from, to } = edge.into();
            if store.forward.entry(from).or_default().insert(to) {
                store.reverse.entry(to).or_default().insert(from);
                store.edge_count += 1;
            }
        }
        store
    }

    /// Nodes `node` depends on directly
    pub fn dependencies_of(&self, node: N) -> impl Iterator<Item = N> + '_ {
        self.forward.get(&node).into_iter().flatten().copied()
    }

    /// Nodes that depend directly on `node`
    pub fn dependents_of(&self, node: N) -> impl Iterator<Item = N> + '_ {
        self.reverse.get(&node).into_iter().flatten().copied()
    }

    pub fn dependency_count(&self, node: N) -> usize {
        self.forward.get(&node).map_or(0, HashSet::len)
    }

    pub fn dependent_count(&self, node: N) -> usize {
        self.reverse.get(&node).map_or(0, HashSet::len)
    }

    /// Check if `from` already depends directly on `to`
    pub fn has_edge(&self, from: N, to: N) -> bool {
        self.forward.get(&from).is_some_and(|deps| deps.contains(&to))
    }

    /// Check if the node appears as an endpoint of any edge
    pub fn contains_node(&self, node: N) -> bool {
        self.forward.contains_key(&node) || self.reverse.contains_key(&node)
    }

    /// Every node that appears as an endpoint of at least one edge
    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.forward.keys().copied().chain(
            self.reverse
                .keys()
                .copied()
                .filter(|node| !self.forward.contains_key(node)),
        )
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge<N>> + '_ {
        self.forward
            .iter()
            .flat_map(|(&from, deps)| deps.iter().map(move |&to| Edge::new(from, to)))
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Forward adjacency view for graph algorithms
    pub fn adjacency(&self) -> &Adjacency<N> {
        &self.forward
    }

    /// Nodes sitting on a directed cycle in this snapshot
    pub fn cyclic_nodes(&self) -> BTreeSet<N> {
        algorithms::cyclic_nodes(&self.forward)
    }
}

impl<N: NodeId> FromIterator<Edge<N>> for EdgeStore<N> {
    fn from_iter<I: IntoIterator<Item = Edge<N>>>(iter: I) -> Self {
        Self::load(iter)
    }
}
