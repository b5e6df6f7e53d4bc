//! Scratch graph - local what-if copy of the neighbourhood of one brick
//!
//! Removal and cut decisions are made on a small ring around the brick
//! instead of the whole model: build the ring once, measure, mutate,
//! measure again, reset the synthetic part and try the next candidate.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::brick::BrickId;

use super::brick_graph::BrickGraph;
use super::connectivity;

/// Ring radius (in vertical hops) of the local snapshot
pub const RING_DEPTH: usize = 3;

/// Component counts of a scratch graph state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalCounts {
    pub components: usize,
    pub bicomponents: usize,
}

impl LocalCounts {
    /// True if neither count is higher than in `baseline`
    pub fn is_no_worse_than(&self, baseline: &LocalCounts) -> bool {
        self.components <= baseline.components && self.bicomponents <= baseline.bicomponents
    }

    /// No worse in either count and strictly better in at least one
    pub fn improves_on(&self, other: &LocalCounts) -> bool {
        self.is_no_worse_than(other) && self != other
    }
}

/// Small mutable undirected graph with tombstoned vertices
#[derive(Clone, Debug, Default)]
pub struct ScratchGraph {
    adjacency: Vec<BTreeSet<usize>>,
    alive: Vec<bool>,
    /// Global brick -> local vertex
    local: HashMap<BrickId, usize>,
    /// Local vertex -> global brick (None for synthetic vertices)
    global: Vec<Option<BrickId>>,
}

impl ScratchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the vertical neighbourhood of `center` up to `depth` hops.
    ///
    /// Edges between two vertices on the outermost ring are left out, so
    /// the snapshot is exact for everything up to `depth - 1` hops.
    pub fn around(graph: &BrickGraph, center: BrickId, depth: usize) -> Self {
        let mut scratch = Self::new();
        let mut distance: HashMap<BrickId, usize> = HashMap::new();
        let mut queue = VecDeque::new();

        scratch.add_global(center);
        distance.insert(center, 0);
        queue.push_back(center);

        while let Some(id) = queue.pop_front() {
            let d = distance[&id];
            if d >= depth {
                continue;
            }
            for &next in graph.vertical_neighbours(id) {
                if !distance.contains_key(&next) {
                    distance.insert(next, d + 1);
                    scratch.add_global(next);
                    queue.push_back(next);
                }
                let (a, b) = (scratch.local[&id], scratch.local[&next]);
                scratch.add_edge(a, b);
            }
        }

        scratch
    }

    fn add_global(&mut self, id: BrickId) -> usize {
        let v = self.add_vertex();
        self.global[v] = Some(id);
        self.local.insert(id, v);
        v
    }

    /// Add a synthetic vertex with no global counterpart
    pub fn add_vertex(&mut self) -> usize {
        self.adjacency.push(BTreeSet::new());
        self.alive.push(true);
        self.global.push(None);
        self.adjacency.len() - 1
    }

    /// Add an undirected edge, ignoring self loops and duplicates
    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a == b || !self.alive[a] || !self.alive[b] {
            return;
        }
        self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
    }

    /// Drop every edge touching `v`, keeping the vertex
    pub fn clear_vertex(&mut self, v: usize) {
        let neighbours = std::mem::take(&mut self.adjacency[v]);
        for w in neighbours {
            self.adjacency[w].remove(&v);
        }
    }

    /// Remove `v` from the graph
    pub fn remove_vertex(&mut self, v: usize) {
        self.clear_vertex(v);
        self.alive[v] = false;
    }

    /// Local vertex of a global brick, if it is part of the snapshot
    pub fn local_of(&self, id: BrickId) -> Option<usize> {
        self.local.get(&id).copied()
    }

    /// Global brick behind a local vertex
    pub fn global_of(&self, v: usize) -> Option<BrickId> {
        self.global.get(v).copied().flatten()
    }

    /// Number of live vertices
    pub fn vertex_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Connected and biconnected component counts of the live part
    pub fn counts(&self) -> LocalCounts {
        let mut compact = vec![usize::MAX; self.adjacency.len()];
        let mut next = 0;
        for (v, alive) in self.alive.iter().enumerate() {
            if *alive {
                compact[v] = next;
                next += 1;
            }
        }

        let mut dense = vec![Vec::new(); next];
        for (v, neighbours) in self.adjacency.iter().enumerate() {
            if self.alive[v] {
                dense[compact[v]] = neighbours.iter().map(|&w| compact[w]).collect();
            }
        }

        LocalCounts {
            components: connectivity::connected_components(&dense).count,
            bicomponents: connectivity::biconnected_components(&dense).count,
        }
    }
}
