//! Brick-count limiter - cut over-quota bricks into smaller legal pieces

use std::collections::{BTreeMap, BTreeSet};

use crate::brick::{Brick, BrickId, BrickSize};
use crate::graph::{LocalCounts, RING_DEPTH, ScratchGraph};

use super::model::BrickModel;

/// Bisection of a brick into two catalog footprints
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cut {
    pub first: Brick,
    pub second: Brick,
}

/// Footprint still over its quota after limitation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaShortfall {
    pub size: BrickSize,
    pub count: usize,
    pub limit: usize,
}

/// Outcome of [`BrickModel::solve_brick_number_limitation`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LimitReport {
    pub cuts_applied: usize,
    pub shortfalls: Vec<QuotaShortfall>,
    /// Over-quota bricks for which every cut would weaken the structure
    pub uncuttable: Vec<Brick>,
}

impl LimitReport {
    pub fn is_satisfied(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

impl BrickModel {
    /// Every axis-aligned bisection of the brick into two legal footprints,
    /// cuts across x first, then across y
    pub fn possible_cuts(&self, id: BrickId) -> Vec<Cut> {
        let Some(brick) = self.graph.get(id) else {
            return Vec::new();
        };
        let catalog = &self.config.catalog;
        let (level, x, y) = (brick.level(), brick.pos_x(), brick.pos_y());
        let (size_x, size_y) = (brick.size_x(), brick.size_y());
        let mut cuts = Vec::new();

        for at in 1..size_x {
            if catalog.allows(at, size_y) && catalog.allows(size_x - at, size_y) {
                cuts.push(Cut {
                    first: Brick::new(level, x, y, at, size_y),
                    second: Brick::new(level, x + at, y, size_x - at, size_y),
                });
            }
        }
        for at in 1..size_y {
            if catalog.allows(size_x, at) && catalog.allows(size_x, size_y - at) {
                cuts.push(Cut {
                    first: Brick::new(level, x, y, size_x, at),
                    second: Brick::new(level, x, y + at, size_x, size_y - at),
                });
            }
        }
        cuts
    }

    /// Index of the cut that keeps the neighbourhood best connected.
    ///
    /// The brick is replaced in a local snapshot by the two halves of each
    /// cut in turn. The first cut that is no worse than the uncut brick is
    /// kept unless a later one improves on it. `None` if every cut weakens
    /// the structure.
    pub fn find_best_cut(&self, id: BrickId, cuts: &[Cut]) -> Option<usize> {
        if !self.graph.contains(id) {
            return None;
        }
        let mut scratch = ScratchGraph::around(&self.graph, id, RING_DEPTH);
        let baseline = scratch.counts();
        if let Some(center) = scratch.local_of(id) {
            scratch.remove_vertex(center);
        }
        let first = scratch.add_vertex();
        let second = scratch.add_vertex();

        let mut best: Option<(usize, LocalCounts)> = None;
        for (index, cut) in cuts.iter().enumerate() {
            for &n in self.graph.vertical_neighbours(id) {
                let (Some(local), Some(brick)) = (scratch.local_of(n), self.graph.get(n)) else {
                    continue;
                };
                if cut.first.is_connected_to(brick) {
                    scratch.add_edge(first, local);
                }
                if cut.second.is_connected_to(brick) {
                    scratch.add_edge(second, local);
                }
            }
            let counts = scratch.counts();
            scratch.clear_vertex(first);
            scratch.clear_vertex(second);

            let accept = match &best {
                None => counts.is_no_worse_than(&baseline),
                Some((_, current)) => counts.improves_on(current),
            };
            if accept {
                best = Some((index, counts));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Replace a brick by the two halves of `cut`. Returns the new bricks.
    /// The voxel grid is released.
    ///
    /// # Panics
    /// If the brick is stale or the cut does not cover it.
    pub fn cut_brick(&mut self, id: BrickId, cut: &Cut) -> (BrickId, BrickId) {
        let old = *self.graph.brick(id);
        let (first, second) = (cut.first, cut.second);
        let (x, y, size_x, size_y) = first.bounding_rect(&second);
        assert!(
            first.tiles_with(&second)
                && first.level() == old.level()
                && (x, y, size_x, size_y) == (old.pos_x(), old.pos_y(), old.size_x(), old.size_y()),
            "cut does not cover {}",
            old
        );
        self.release_grid();

        let old_lateral: Vec<BrickId> = self.graph.lateral_neighbours(id).iter().copied().collect();
        let old_vertical: Vec<BrickId> = self.graph.vertical_neighbours(id).iter().copied().collect();
        self.graph.remove_brick(id);

        let mut halves = [first, second];
        for half in &mut halves {
            half.set_color_id(old.color_id());
            half.set_outer(old.is_outer());
        }
        let a = self.graph.add_brick(halves[0]);
        let b = self.graph.add_brick(halves[1]);
        self.graph.add_lateral(a, b);

        for (half, brick) in [(a, halves[0]), (b, halves[1])] {
            for &n in &old_lateral {
                if brick.is_lateral_neighbour(self.graph.brick(n)) {
                    self.graph.add_lateral(half, n);
                }
            }
            for &n in &old_vertical {
                if brick.is_connected_to(self.graph.brick(n)) {
                    self.graph.add_edge(half, n);
                }
            }
        }
        (a, b)
    }

    /// Cut bricks of over-quota footprints until every quota holds or no
    /// cut is left that keeps the structure intact.
    ///
    /// Merges enforce the quotas from now on.
    pub fn solve_brick_number_limitation(&mut self) -> LimitReport {
        let mut cuts_applied = 0;
        let mut uncuttable: BTreeSet<BrickId>;

        loop {
            uncuttable = BTreeSet::new();
            let mut progressed = false;
            let ids: Vec<BrickId> = self.graph.ids().collect();

            for id in ids {
                let Some(brick) = self.graph.get(id).copied() else {
                    continue;
                };
                let size = brick.size();
                let Some(&limit) = self.limits.get(&size) else {
                    continue;
                };
                if self.graph.type_count(size) <= limit {
                    continue;
                }

                let cuts = self.possible_cuts(id);
                match self.find_best_cut(id, &cuts) {
                    Some(index) => {
                        self.cut_brick(id, &cuts[index]);
                        cuts_applied += 1;
                        progressed = true;
                    }
                    None => {
                        log::debug!("No safe cut for {}", brick);
                        uncuttable.insert(id);
                    }
                }
            }

            if !progressed {
                break;
            }
        }

        self.graph.refresh_connectivity();
        self.quota_enforced = true;

        let mut shortfalls = Vec::new();
        let over: BTreeMap<BrickSize, usize> = self
            .limits
            .iter()
            .filter(|&(size, limit)| self.graph.type_count(*size) > *limit)
            .map(|(size, limit)| (*size, *limit))
            .collect();
        for (size, limit) in over {
            let count = self.graph.type_count(size);
            log::warn!("Cannot bring {} bricks down to {} (still {})", size, limit, count);
            shortfalls.push(QuotaShortfall { size, count, limit });
        }

        LimitReport {
            cuts_applied,
            shortfalls,
            uncuttable: uncuttable
                .into_iter()
                .filter_map(|id| self.graph.get(id).copied())
                .collect(),
        }
    }
}
