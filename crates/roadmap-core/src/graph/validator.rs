use super::algorithms;
use super::store::EdgeStore;
use super::traits::NodeId;
use crate::{RoadmapError, RoadmapResult};

/// Decide whether `from -> to` may be added to the snapshot
///
/// Checks run in order: self-dependency, duplicate, cycle. The cycle check
/// searches for `from` starting at `to`; if it is reachable, `to` already
/// depends (transitively) on `from` and the new edge would close a cycle.
pub fn can_add<N: NodeId>(store: &EdgeStore<N>, from: N, to: N) -> RoadmapResult<()> {
    if from == to {
        return Err(RoadmapError::SelfDependency {
            node: from.to_string(),
        });
    }

    if store.has_edge(from, to) {
        return Err(RoadmapError::DuplicateEdge {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    if let Some(chain) = algorithms::find_path(store.adjacency(), to, from) {
        let path = std::iter::once(from)
            .chain(chain)
            .map(|node| node.to_string())
            .collect();
        return Err(RoadmapError::CycleDetected {
            from: from.to_string(),
            to: to.to_string(),
            path,
        });
    }

    Ok(())
}
