//! Brick graph - owns every live brick and its adjacency
//!
//! Vertices are bricks stored in a slot arena addressed by [`BrickId`].
//! Two adjacency relations are kept per brick:
//! - vertical edges (stud connections to the level above/below), the
//!   structural graph the connectivity analysis runs on;
//! - lateral neighbours (bricks sharing a grid edge on the same level),
//!   used for merge candidates and to propagate splits.
//!
//! All mutation goes through `add_brick` / `remove_brick` so per-type
//! counts and the outer/inner pools never drift from the live set.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::brick::{Brick, BrickId, BrickSize};

use super::connectivity::{self, ConnectivityAnalysis};
use super::pool::CandidatePool;

static NO_NEIGHBOURS: BTreeSet<BrickId> = BTreeSet::new();

/// Per-vertex connectivity annotation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexAnnotation {
    /// Connected component id
    pub component: usize,
    /// Removal would disconnect the graph
    pub is_articulation: bool,
    /// Removal would leave at least two non-trivial pieces
    pub is_bad_articulation: bool,
}

#[derive(Clone, Debug)]
struct BrickNode {
    brick: Brick,
    lateral: BTreeSet<BrickId>,
    vertical: BTreeSet<BrickId>,
    annotation: VertexAnnotation,
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<BrickNode>,
}

/// Structural brick graph plus lateral neighbour map
#[derive(Clone, Debug, Default)]
pub struct BrickGraph {
    /// Arena of brick nodes
    slots: Vec<Slot>,
    /// Queue of free slot indices
    free_slots: Vec<u32>,
    /// Number of live bricks
    live_count: usize,
    /// Highest level ever used + 1
    level_count: i32,
    /// Live bricks per footprint
    type_counts: BTreeMap<BrickSize, usize>,
    /// Bricks touching empty space
    outer: CandidatePool,
    /// Fully enclosed bricks
    inner: CandidatePool,
    /// Biconnected component per vertical edge
    edge_components: HashMap<(BrickId, BrickId), usize>,
    component_count: usize,
    bicomponent_count: usize,
    bad_articulation_count: usize,
    /// Topology changed since the last connectivity refresh
    dirty: bool,
}

fn edge_key(a: BrickId, b: BrickId) -> (BrickId, BrickId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl BrickGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: BrickId) -> Option<&BrickNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: BrickId) -> Option<&mut BrickNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn expect_node_mut(&mut self, id: BrickId) -> &mut BrickNode {
        match self.node_mut(id) {
            Some(node) => node,
            None => panic!("stale brick handle {}", id),
        }
    }

    /// Insert a brick as a new vertex with no adjacency.
    ///
    /// The brick joins the outer or inner pool according to its flag.
    pub fn add_brick(&mut self, brick: Brick) -> BrickId {
        let node = BrickNode {
            brick,
            lateral: BTreeSet::new(),
            vertical: BTreeSet::new(),
            annotation: VertexAnnotation::default(),
        };

        let id = match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.node.is_none());
                slot.node = Some(node);
                BrickId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot { generation: 0, node: Some(node) });
                BrickId::new((self.slots.len() - 1) as u32, 0)
            }
        };

        self.live_count += 1;
        self.level_count = self.level_count.max(brick.level() + 1);
        *self.type_counts.entry(brick.size()).or_insert(0) += 1;
        if brick.is_outer() {
            self.outer.insert(id);
        } else {
            self.inner.insert(id);
        }
        self.dirty = true;
        id
    }

    /// Remove a brick and every reference to it. Returns the removed brick.
    pub fn remove_brick(&mut self, id: BrickId) -> Option<Brick> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.node.is_none() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(id.index);

        for neighbour in &node.lateral {
            if let Some(n) = self.node_mut(*neighbour) {
                n.lateral.remove(&id);
            }
        }
        for neighbour in &node.vertical {
            if let Some(n) = self.node_mut(*neighbour) {
                n.vertical.remove(&id);
            }
            self.edge_components.remove(&edge_key(id, *neighbour));
        }

        self.outer.remove(id);
        self.inner.remove(id);

        let size = node.brick.size();
        if let Some(count) = self.type_counts.get_mut(&size) {
            *count -= 1;
            if *count == 0 {
                self.type_counts.remove(&size);
            }
        }

        self.live_count -= 1;
        self.dirty = true;
        Some(node.brick)
    }

    pub fn contains(&self, id: BrickId) -> bool {
        self.node(id).is_some()
    }

    /// Brick behind a handle, `None` if the handle is stale
    pub fn get(&self, id: BrickId) -> Option<&Brick> {
        self.node(id).map(|n| &n.brick)
    }

    /// Brick behind a live handle
    ///
    /// # Panics
    /// If the handle is stale.
    pub fn brick(&self, id: BrickId) -> &Brick {
        match self.get(id) {
            Some(brick) => brick,
            None => panic!("stale brick handle {}", id),
        }
    }

    pub fn set_color(&mut self, id: BrickId, color_id: usize) {
        self.expect_node_mut(id).brick.set_color_id(color_id);
    }

    /// Update the outer flag and move the brick to the matching pool
    pub fn set_outer(&mut self, id: BrickId, is_outer: bool) {
        self.expect_node_mut(id).brick.set_outer(is_outer);
        if is_outer {
            self.inner.remove(id);
            self.outer.insert(id);
        } else {
            self.outer.remove(id);
            self.inner.insert(id);
        }
    }

    /// Record that two bricks share a grid edge on the same level
    pub fn add_lateral(&mut self, a: BrickId, b: BrickId) {
        assert_ne!(a, b, "a brick cannot neighbour itself");
        self.expect_node_mut(a).lateral.insert(b);
        self.expect_node_mut(b).lateral.insert(a);
    }

    /// Add the vertical edge `a - b` (at most one per pair)
    pub fn add_edge(&mut self, a: BrickId, b: BrickId) -> bool {
        assert_ne!(a, b, "self loops are not allowed");
        let inserted = self.expect_node_mut(a).vertical.insert(b);
        self.expect_node_mut(b).vertical.insert(a);
        if inserted {
            self.dirty = true;
        }
        inserted
    }

    pub fn has_edge(&self, a: BrickId, b: BrickId) -> bool {
        self.node(a).is_some_and(|n| n.vertical.contains(&b))
    }

    /// Same-level neighbours of a brick (empty for stale handles)
    pub fn lateral_neighbours(&self, id: BrickId) -> &BTreeSet<BrickId> {
        self.node(id).map(|n| &n.lateral).unwrap_or(&NO_NEIGHBOURS)
    }

    /// Vertically connected bricks (empty for stale handles)
    pub fn vertical_neighbours(&self, id: BrickId) -> &BTreeSet<BrickId> {
        self.node(id).map(|n| &n.vertical).unwrap_or(&NO_NEIGHBOURS)
    }

    /// Number of vertical edges at a brick
    pub fn degree(&self, id: BrickId) -> usize {
        self.vertical_neighbours(id).len()
    }

    /// Live brick ids in arena order
    pub fn ids(&self) -> impl Iterator<Item = BrickId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|_| BrickId::new(index as u32, slot.generation))
        })
    }

    /// Live bricks with their ids in arena order
    pub fn bricks(&self) -> impl Iterator<Item = (BrickId, &Brick)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|n| (BrickId::new(index as u32, slot.generation), &n.brick))
        })
    }

    /// Live bricks on one level
    pub fn bricks_on_level(&self, level: i32) -> impl Iterator<Item = (BrickId, &Brick)> + '_ {
        self.bricks().filter(move |(_, b)| b.level() == level)
    }

    pub fn len(&self) -> usize {
        self.live_count
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    pub fn level_count(&self) -> i32 {
        self.level_count
    }

    /// Live count of one footprint
    pub fn type_count(&self, size: BrickSize) -> usize {
        self.type_counts.get(&size).copied().unwrap_or(0)
    }

    /// Live counts of every footprint present
    pub fn type_counts(&self) -> &BTreeMap<BrickSize, usize> {
        &self.type_counts
    }

    pub fn outer_pool(&self) -> &CandidatePool {
        &self.outer
    }

    pub fn inner_pool(&self) -> &CandidatePool {
        &self.inner
    }

    /// True if the topology changed since the last [`Self::refresh_connectivity`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dense view of the vertical graph: ids in arena order and adjacency by position
    pub fn dense_adjacency(&self) -> (Vec<BrickId>, Vec<Vec<usize>>) {
        let ids: Vec<BrickId> = self.ids().collect();
        let position: HashMap<BrickId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let adjacency = ids
            .iter()
            .map(|id| {
                self.vertical_neighbours(*id)
                    .iter()
                    .map(|n| position[n])
                    .collect()
            })
            .collect();
        (ids, adjacency)
    }

    /// Recompute components, biconnected components and articulation flags
    pub fn refresh_connectivity(&mut self) -> ConnectivityAnalysis {
        let (ids, adjacency) = self.dense_adjacency();
        let analysis = connectivity::analyze(&adjacency);

        for (i, id) in ids.iter().enumerate() {
            let annotation = VertexAnnotation {
                component: analysis.components.labels[i],
                is_articulation: analysis.bicon.articulation[i],
                is_bad_articulation: analysis.bad_articulation[i],
            };
            self.expect_node_mut(*id).annotation = annotation;
        }

        self.edge_components = analysis
            .bicon
            .edge_components
            .iter()
            .map(|(&(a, b), &component)| (edge_key(ids[a], ids[b]), component))
            .collect();

        self.component_count = analysis.component_count();
        self.bicomponent_count = analysis.bicomponent_count();
        self.bad_articulation_count = analysis.bad_articulation_count();
        self.dirty = false;
        analysis
    }

    /// Connectivity annotation of a brick as of the last refresh
    pub fn annotation(&self, id: BrickId) -> Option<VertexAnnotation> {
        debug_assert!(!self.dirty, "reading stale connectivity annotations");
        self.node(id).map(|n| n.annotation)
    }

    /// Biconnected component of the vertical edge `a - b` as of the last refresh
    pub fn edge_component(&self, a: BrickId, b: BrickId) -> Option<usize> {
        debug_assert!(!self.dirty, "reading stale connectivity annotations");
        self.edge_components.get(&edge_key(a, b)).copied()
    }

    pub fn component_count(&self) -> usize {
        debug_assert!(!self.dirty, "reading stale connectivity annotations");
        self.component_count
    }

    pub fn bicomponent_count(&self) -> usize {
        debug_assert!(!self.dirty, "reading stale connectivity annotations");
        self.bicomponent_count
    }

    pub fn bad_articulation_count(&self) -> usize {
        debug_assert!(!self.dirty, "reading stale connectivity annotations");
        self.bad_articulation_count
    }

    /// Check every structural invariant, returning the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut counts: BTreeMap<BrickSize, usize> = BTreeMap::new();
        let mut live = 0;

        for (id, brick) in self.bricks() {
            live += 1;
            *counts.entry(brick.size()).or_insert(0) += 1;

            let in_outer = self.outer.contains(id);
            let in_inner = self.inner.contains(id);
            if in_outer == in_inner || in_outer != brick.is_outer() {
                return Err(format!("{} is not in exactly its own pool", brick));
            }

            for &n in self.lateral_neighbours(id) {
                let Some(other) = self.get(n) else {
                    return Err(format!("{} has a dangling lateral neighbour {}", brick, n));
                };
                if !self.lateral_neighbours(n).contains(&id) {
                    return Err(format!("lateral link {} -> {} is one-way", brick, other));
                }
                if !brick.is_lateral_neighbour(other) {
                    return Err(format!("{} and {} are not grid neighbours", brick, other));
                }
            }

            for &n in self.vertical_neighbours(id) {
                let Some(other) = self.get(n) else {
                    return Err(format!("{} has a dangling vertical edge {}", brick, n));
                };
                if !self.vertical_neighbours(n).contains(&id) {
                    return Err(format!("vertical edge {} -> {} is one-way", brick, other));
                }
                if !brick.is_connected_to(other) {
                    return Err(format!("{} and {} are not stacked", brick, other));
                }
            }

            if brick.is_unit() && self.degree(id) > 2 {
                return Err(format!("unit {} has more than two vertical edges", brick));
            }
        }

        if live != self.live_count {
            return Err(format!("live count {} != {}", self.live_count, live));
        }
        if counts != self.type_counts {
            return Err(format!("type counts {:?} != {:?}", self.type_counts, counts));
        }
        if self.outer.len() + self.inner.len() != live {
            return Err("pools do not partition the live bricks".to_string());
        }
        Ok(())
    }
}
