use std::collections::{BTreeSet, HashMap, HashSet};

use super::traits::NodeId;

/// Forward adjacency: node -> set of nodes it depends on
pub type Adjacency<N> = HashMap<N, HashSet<N>>;

/// Find a path from start to end using DFS
///
/// Returns the nodes along the path, both ends included. Neighbors are
/// visited in ascending order so the same graph always yields the same path.
pub fn find_path<N: NodeId>(adj: &Adjacency<N>, start: N, end: N) -> Option<Vec<N>> {
    let mut parents: HashMap<N, N> = HashMap::new();
    let mut visited = HashSet::new();
    let mut stack = vec![start];
    visited.insert(start);

    while let Some(node) = stack.pop() {
        if node == end {
            let mut path = vec![end];
            let mut current = end;
            while let Some(&parent) = parents.get(&current) {
                path.push(parent);
                current = parent;
            }
            path.reverse();
            return Some(path);
        }

        if let Some(neighbors) = adj.get(&node) {
            let mut sorted: Vec<N> = neighbors.iter().copied().collect();
            // Reverse order on the stack pops the smallest neighbor first
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            for neighbor in sorted {
                if visited.insert(neighbor) {
                    parents.insert(neighbor, node);
                    stack.push(neighbor);
                }
            }
        }
    }

    None
}

/// Every node that sits on a directed cycle
///
/// Tarjan's strongly connected components: a node is cyclic when its
/// component has more than one member or when it depends on itself.
/// The DFS keeps its own frame stack, so depth is bounded by memory rather
/// than by the thread stack.
pub fn cyclic_nodes<N: NodeId>(adj: &Adjacency<N>) -> BTreeSet<N> {
    let mut tarjan = Tarjan {
        adj,
        next_index: 0,
        indices: HashMap::new(),
        lowlinks: HashMap::new(),
        stack: Vec::new(),
        on_stack: HashSet::new(),
        frames: Vec::new(),
        cyclic: BTreeSet::new(),
    };

    let mut roots: Vec<N> = adj.keys().copied().collect();
    roots.sort_unstable();
    for node in roots {
        if !tarjan.indices.contains_key(&node) {
            tarjan.strong_connect(node);
        }
    }

    tarjan.cyclic
}

/// One suspended DFS call: the node and the next neighbor to look at
struct Frame<N> {
    node: N,
    neighbors: Vec<N>,
    cursor: usize,
}

struct Tarjan<'a, N> {
    adj: &'a Adjacency<N>,
    next_index: usize,
    indices: HashMap<N, usize>,
    lowlinks: HashMap<N, usize>,
    stack: Vec<N>,
    on_stack: HashSet<N>,
    frames: Vec<Frame<N>>,
    cyclic: BTreeSet<N>,
}

impl<N: NodeId> Tarjan<'_, N> {
    fn strong_connect(&mut self, root: N) {
        self.enter(root);

        while let Some(frame) = self.frames.last_mut() {
            let node = frame.node;
            let next = frame.neighbors.get(frame.cursor).copied();

            match next {
                Some(neighbor) => {
                    frame.cursor += 1;
                    if !self.indices.contains_key(&neighbor) {
                        self.enter(neighbor);
                    } else if self.on_stack.contains(&neighbor) {
                        self.lower(node, self.indices[&neighbor]);
                    }
                }
                None => {
                    self.frames.pop();
                    if let Some(parent) = self.frames.last().map(|frame| frame.node) {
                        self.lower(parent, self.lowlinks[&node]);
                    }
                    if self.lowlinks[&node] == self.indices[&node] {
                        self.close_component(node);
                    }
                }
            }
        }
    }

    fn enter(&mut self, node: N) {
        let index = self.next_index;
        self.next_index += 1;
        self.indices.insert(node, index);
        self.lowlinks.insert(node, index);
        self.stack.push(node);
        self.on_stack.insert(node);

        let mut neighbors: Vec<N> = self
            .adj
            .get(&node)
            .map(|deps| deps.iter().copied().collect())
            .unwrap_or_default();
        neighbors.sort_unstable();
        self.frames.push(Frame {
            node,
            neighbors,
            cursor: 0,
        });
    }

    fn lower(&mut self, node: N, candidate: usize) {
        if let Some(low) = self.lowlinks.get_mut(&node) {
            *low = (*low).min(candidate);
        }
    }

    fn close_component(&mut self, node: N) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(&member);
            component.push(member);
            if member == node {
                break;
            }
        }

        let self_loop = self.adj.get(&node).is_some_and(|deps| deps.contains(&node));
        if component.len() > 1 || self_loop {
            self.cyclic.extend(component);
        }
    }
}
