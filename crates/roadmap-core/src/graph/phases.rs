use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use super::algorithms::{self, Adjacency};
use super::store::EdgeStore;
use super::traits::NodeId;

/// Phase given to nodes with no dependencies, and to nodes on a cycle
pub const ROOT_PHASE: u32 = 1;

/// Nodes found on a dependency cycle while computing phases
///
/// Not a failure: every node still receives a phase. Cyclic nodes are
/// pinned to [`ROOT_PHASE`] and listed here so callers can tell them apart
/// from genuine roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CyclicNodesWarning<N> {
    pub nodes: BTreeSet<N>,
}

impl<N: NodeId> CyclicNodesWarning<N> {
    pub fn contains(&self, node: N) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<N: NodeId> fmt::Display for CyclicNodesWarning<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} node(s) on a dependency cycle were assigned phase {}: {}",
            nodes.len(),
            ROOT_PHASE,
            nodes.join(", ")
        )
    }
}

/// Result of one phase computation over a snapshot
#[derive(Debug, Clone)]
pub struct PhaseReport<N> {
    phases: HashMap<N, u32>,
    warning: Option<CyclicNodesWarning<N>>,
}

impl<N: NodeId> PhaseReport<N> {
    pub fn phase_of(&self, node: N) -> Option<u32> {
        self.phases.get(&node).copied()
    }

    pub fn phases(&self) -> &HashMap<N, u32> {
        &self.phases
    }

    pub fn warning(&self) -> Option<&CyclicNodesWarning<N>> {
        self.warning.as_ref()
    }

    pub fn is_cyclic(&self, node: N) -> bool {
        self.warning.as_ref().is_some_and(|w| w.contains(node))
    }

    /// True when no cycle was found in the snapshot
    pub fn is_consistent(&self) -> bool {
        self.warning.is_none()
    }

    pub fn max_phase(&self) -> u32 {
        self.phases.values().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Nodes grouped into planning waves: wave `i` holds every node whose
    /// phase is `i + 1`, sorted. Phases are contiguous, so no wave is empty.
    pub fn waves(&self) -> Vec<Vec<N>> {
        let mut grouped: BTreeMap<u32, Vec<N>> = BTreeMap::new();
        for (&node, &phase) in &self.phases {
            grouped.entry(phase).or_default().push(node);
        }

        grouped
            .into_values()
            .map(|mut wave| {
                wave.sort_unstable();
                wave
            })
            .collect()
    }
}

/// Compute a phase for every node in one pass
///
/// `phase(n) = 1` when `n` has no dependencies, otherwise
/// `1 + max(phase(d))` over its dependencies. Every endpoint of an edge in
/// the snapshot gets a phase, plus every node in `all_nodes` (edgeless
/// nodes land in phase 1).
///
/// Kahn's algorithm: a node becomes eligible once all its dependencies hold
/// a phase. When no node is eligible but some remain, the leftovers either
/// sit on a cycle or depend on one. Cycle members are pinned to
/// [`ROOT_PHASE`] and reported, then the pass resumes so their dependents
/// still get `1 + max(...)`. Always terminates.
pub fn compute_phases<N, I>(store: &EdgeStore<N>, all_nodes: I) -> PhaseReport<N>
where
    N: NodeId,
    I: IntoIterator<Item = N>,
{
    let mut nodes: HashSet<N> = all_nodes.into_iter().collect();
    nodes.extend(store.nodes());

    let mut pending: HashMap<N, usize> = nodes
        .iter()
        .map(|&node| (node, store.dependency_count(node)))
        .collect();
    let mut floor: HashMap<N, u32> = HashMap::new();
    let mut phases: HashMap<N, u32> = HashMap::with_capacity(nodes.len());
    let mut cyclic: BTreeSet<N> = BTreeSet::new();

    let mut ready: VecDeque<N> = pending
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(&node, _)| node)
        .collect();

    loop {
        while let Some(node) = ready.pop_front() {
            let phase = floor.get(&node).copied().unwrap_or(ROOT_PHASE);
            phases.insert(node, phase);
            release_dependents(
                store,
                node,
                phase,
                &phases,
                &mut pending,
                &mut floor,
                &mut ready,
            );
        }

        if phases.len() == nodes.len() {
            break;
        }

        let unresolved: HashSet<N> = nodes
            .iter()
            .copied()
            .filter(|node| !phases.contains_key(node))
            .collect();
        let mut stuck = algorithms::cyclic_nodes(&restrict(store, &unresolved));
        if stuck.is_empty() {
            // Unreachable for a well-formed store; pin everything left so the
            // loop still makes progress.
            stuck = unresolved.into_iter().collect();
        }

        for &node in &stuck {
            phases.insert(node, ROOT_PHASE);
        }
        for &node in &stuck {
            release_dependents(
                store,
                node,
                ROOT_PHASE,
                &phases,
                &mut pending,
                &mut floor,
                &mut ready,
            );
        }
        cyclic.extend(stuck);
    }

    let warning = (!cyclic.is_empty()).then_some(CyclicNodesWarning { nodes: cyclic });
    PhaseReport { phases, warning }
}

fn release_dependents<N: NodeId>(
    store: &EdgeStore<N>,
    node: N,
    phase: u32,
    phases: &HashMap<N, u32>,
    pending: &mut HashMap<N, usize>,
    floor: &mut HashMap<N, u32>,
    ready: &mut VecDeque<N>,
) {
    for dependent in store.dependents_of(node) {
        if phases.contains_key(&dependent) {
            continue;
        }

        let bound = floor.entry(dependent).or_insert(ROOT_PHASE);
        *bound = (*bound).max(phase + 1);

        if let Some(count) = pending.get_mut(&dependent) {
            *count -= 1;
            if *count == 0 {
                ready.push_back(dependent);
            }
        }
    }
}

/// Forward adjacency limited to edges whose endpoints are both in `keep`
fn restrict<N: NodeId>(store: &EdgeStore<N>, keep: &HashSet<N>) -> Adjacency<N> {
    let mut adj: Adjacency<N> = HashMap::new();
    for &node in keep {
        let deps: HashSet<N> = store
            .dependencies_of(node)
            .filter(|dep| keep.contains(dep))
            .collect();
        if !deps.is_empty() {
            adj.insert(node, deps);
        }
    }
    adj
}
