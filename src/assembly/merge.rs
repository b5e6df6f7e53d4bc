//! Merge engine - greedy fusing of lateral neighbours into larger bricks
//!
//! A merge pass picks a random brick from a pool and keeps growing it
//! while a mergeable neighbour exists. The pass ends after as many
//! consecutive failed picks as the pool holds bricks.

use std::collections::BTreeSet;

use rand::RngCore;
use rand::seq::SliceRandom;

use crate::brick::{Brick, BrickId, BrickSize};
use crate::graph::BrickGraph;

use super::model::BrickModel;

/// Picks which mergeable neighbour a brick fuses with
pub trait MergeStrategy {
    fn name(&self) -> &'static str;

    /// Choose one of `candidates` (all mergeable with `brick`), `None` if empty
    fn choose(
        &self,
        graph: &BrickGraph,
        brick: BrickId,
        candidates: &[BrickId],
        rng: &mut dyn RngCore,
    ) -> Option<BrickId>;
}

/// Uniformly random candidate
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomStrategy;

impl MergeStrategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(
        &self,
        _graph: &BrickGraph,
        _brick: BrickId,
        candidates: &[BrickId],
        rng: &mut dyn RngCore,
    ) -> Option<BrickId> {
        candidates.choose(rng).copied()
    }
}

/// Candidate keeping the most distinct vertical connections after fusing,
/// random among ties
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxConnectivityStrategy;

impl MaxConnectivityStrategy {
    /// Distinct vertical neighbours of the fused brick
    pub fn score(graph: &BrickGraph, brick: BrickId, candidate: BrickId) -> usize {
        let mut union: BTreeSet<BrickId> = graph.vertical_neighbours(brick).clone();
        union.extend(graph.vertical_neighbours(candidate).iter().copied());
        union.len()
    }
}

impl MergeStrategy for MaxConnectivityStrategy {
    fn name(&self) -> &'static str {
        "max-connectivity"
    }

    fn choose(
        &self,
        graph: &BrickGraph,
        brick: BrickId,
        candidates: &[BrickId],
        rng: &mut dyn RngCore,
    ) -> Option<BrickId> {
        let scored: Vec<(BrickId, usize)> = candidates
            .iter()
            .map(|&c| (c, Self::score(graph, brick, c)))
            .collect();
        let best = scored.iter().map(|(_, s)| *s).max()?;
        let top: Vec<BrickId> = scored
            .into_iter()
            .filter(|(_, s)| *s == best)
            .map(|(c, _)| c)
            .collect();
        top.choose(rng).copied()
    }
}

/// Built-in strategies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrategyKind {
    Random,
    #[default]
    MaxConnectivity,
}

impl StrategyKind {
    pub fn strategy(self) -> &'static dyn MergeStrategy {
        match self {
            StrategyKind::Random => &RandomStrategy,
            StrategyKind::MaxConnectivity => &MaxConnectivityStrategy,
        }
    }
}

/// Parameters of one merge call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeOptions {
    pub strategy: StrategyKind,
    /// Refuse merges that would push a footprint over its quota
    pub enforce_quota: bool,
}

impl MergeOptions {
    /// First merge of a fresh model
    pub fn initial() -> Self {
        Self {
            strategy: StrategyKind::MaxConnectivity,
            enforce_quota: false,
        }
    }

    /// Merges after repairs
    pub fn refine() -> Self {
        Self {
            strategy: StrategyKind::Random,
            enforce_quota: false,
        }
    }

    pub fn with_quota(mut self, enforce_quota: bool) -> Self {
        self.enforce_quota = enforce_quota;
        self
    }
}

/// Which candidate pool a pass walks
#[derive(Clone, Copy, Debug)]
enum Pass {
    Outer,
    Inner,
}

impl BrickModel {
    /// Options the next default merge uses: max-connectivity for the very
    /// first merge, random afterwards, quotas once the limiter has run.
    pub fn next_merge_options(&self) -> MergeOptions {
        let options = if self.merge_count == 0 {
            MergeOptions::initial()
        } else {
            MergeOptions::refine()
        };
        options.with_quota(self.quota_enforced)
    }

    /// Run an outer and an inner merge pass. Returns the number of fusions.
    pub fn merge(&mut self, options: MergeOptions) -> usize {
        self.merge_with(options.strategy.strategy(), options.enforce_quota)
    }

    /// Merge with a custom strategy
    pub fn merge_with(&mut self, strategy: &dyn MergeStrategy, enforce_quota: bool) -> usize {
        self.release_grid();
        let before = self.graph.len();
        let merges = self.merge_pass(Pass::Outer, strategy, enforce_quota)
            + self.merge_pass(Pass::Inner, strategy, enforce_quota);
        self.merge_count += 1;
        self.graph.refresh_connectivity();
        log::debug!(
            "Merge ({}): {} fusions, {} -> {} bricks",
            strategy.name(),
            merges,
            before,
            self.graph.len()
        );
        merges
    }

    fn pick(&mut self, pass: Pass) -> Option<BrickId> {
        match pass {
            Pass::Outer => self.graph.outer_pool().choose(&mut self.rng),
            Pass::Inner => self.graph.inner_pool().choose(&mut self.rng),
        }
    }

    fn pool_len(&self, pass: Pass) -> usize {
        match pass {
            Pass::Outer => self.graph.outer_pool().len(),
            Pass::Inner => self.graph.inner_pool().len(),
        }
    }

    fn merge_pass(&mut self, pass: Pass, strategy: &dyn MergeStrategy, enforce_quota: bool) -> usize {
        let mut merges = 0;
        let mut failures = 0;

        while failures < self.pool_len(pass) {
            let Some(mut brick) = self.pick(pass) else {
                break;
            };
            while let Some(neighbour) = self.find_best_neighbour(brick, strategy, enforce_quota) {
                brick = self.merge_bricks(brick, neighbour);
                merges += 1;
                failures = 0;
            }
            failures += 1;
        }

        merges
    }

    /// True if `a` and `b` can fuse into one legal brick
    pub fn can_merge(&self, a: BrickId, b: BrickId, enforce_quota: bool) -> bool {
        if a == b {
            return false;
        }
        let (Some(first), Some(second)) = (self.graph.get(a), self.graph.get(b)) else {
            return false;
        };
        if !first.tiles_with(second) {
            return false;
        }
        let (_, _, size_x, size_y) = first.bounding_rect(second);
        if !self.config.catalog.allows(size_x, size_y) {
            return false;
        }
        if first.is_outer() && second.is_outer() && first.color_id() != second.color_id() {
            return false;
        }
        if enforce_quota {
            let size = BrickSize::new(size_x, size_y);
            if let Some(limit) = self.limits.get(&size) {
                if self.graph.type_count(size) >= *limit {
                    return false;
                }
            }
        }
        true
    }

    /// Mergeable lateral neighbour chosen by `strategy`
    pub fn find_best_neighbour(
        &mut self,
        brick: BrickId,
        strategy: &dyn MergeStrategy,
        enforce_quota: bool,
    ) -> Option<BrickId> {
        let candidates: Vec<BrickId> = self
            .graph
            .lateral_neighbours(brick)
            .iter()
            .copied()
            .filter(|&n| self.can_merge(brick, n, enforce_quota))
            .collect();
        strategy.choose(&self.graph, brick, &candidates, &mut self.rng)
    }

    /// Replace `a` and `b` by the brick covering both. Returns the new brick.
    /// The voxel grid is released.
    ///
    /// # Panics
    /// If the pair does not tile a catalog footprint.
    pub fn merge_bricks(&mut self, a: BrickId, b: BrickId) -> BrickId {
        let first = *self.graph.brick(a);
        let second = *self.graph.brick(b);
        assert!(first.tiles_with(&second), "{} and {} do not tile a rectangle", first, second);
        let (pos_x, pos_y, size_x, size_y) = first.bounding_rect(&second);
        assert!(
            self.config.catalog.allows(size_x, size_y),
            "{}x{} is not a legal footprint",
            size_x,
            size_y
        );
        self.release_grid();

        let color = match (first.is_outer(), second.is_outer()) {
            (true, true) => {
                debug_assert_eq!(first.color_id(), second.color_id(), "merging visible colours");
                first.color_id()
            }
            (false, true) => second.color_id(),
            _ => first.color_id(),
        };
        let mut merged = Brick::new(first.level(), pos_x, pos_y, size_x, size_y).with_color(color);
        merged.set_outer(first.is_outer() || second.is_outer());

        let lateral: BTreeSet<BrickId> = self
            .graph
            .lateral_neighbours(a)
            .union(self.graph.lateral_neighbours(b))
            .copied()
            .filter(|&n| n != a && n != b)
            .collect();
        let vertical: BTreeSet<BrickId> = self
            .graph
            .vertical_neighbours(a)
            .union(self.graph.vertical_neighbours(b))
            .copied()
            .collect();

        self.graph.remove_brick(a);
        self.graph.remove_brick(b);
        let id = self.graph.add_brick(merged);
        for n in lateral {
            self.graph.add_lateral(id, n);
        }
        for n in vertical {
            self.graph.add_edge(id, n);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::config::AssemblyConfig;
    use crate::assembly::shapes::VoxelShape;
    use crate::brick::BrickCatalog;
    use crate::core::Error;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn config() -> AssemblyConfig {
        AssemblyConfig::with_seed(7)
    }

    fn assert_tiles(model: &BrickModel, shape: &VoxelShape) {
        let mut covered = HashSet::new();
        for (_, brick) in model.graph().bricks() {
            for (x, y) in brick.cells() {
                assert!(covered.insert((brick.level(), x, y)), "overlap at {:?}", (x, y));
            }
        }
        let expected: HashSet<_> = shape.cells.iter().copied().collect();
        assert_eq!(covered, expected);
    }

    fn find(model: &BrickModel, level: i32, x: i32, y: i32) -> BrickId {
        model
            .graph()
            .bricks_on_level(level)
            .find(|(_, b)| b.contains_cell(x, y))
            .map(|(id, _)| id)
            .unwrap()
    }

    #[test]
    fn test_small_block_merges_per_level() {
        let mut model = BrickModel::solid_block(config(), 2, 1, 2).unwrap();
        let options = model.next_merge_options();
        assert_eq!(options.strategy, StrategyKind::MaxConnectivity);
        let merges = model.merge(options);

        assert_eq!(merges, 2);
        assert_eq!(model.brick_count(), 2);
        assert_eq!(model.graph().dense_adjacency().1.iter().map(|n| n.len()).sum::<usize>(), 2);
        assert_eq!(model.component_count(), 1);
        assert_eq!(model.bad_articulation_count(), 0);
        assert_eq!(model.brick_counts().get(&BrickSize::new(1, 2)), Some(&2));
        assert!(!model.has_voxel_grid());
        assert_eq!(model.next_merge_options().strategy, StrategyKind::Random);
    }

    #[test]
    fn test_merge_keeps_tiling_and_consistency() {
        let shape = VoxelShape::block(4, 6, 5);
        let mut model = BrickModel::from_shape(config(), &shape).unwrap();
        let options = model.next_merge_options();
        model.merge(options);

        assert!(model.brick_count() < shape.len());
        assert_tiles(&model, &shape);
        assert!(model.graph().check_consistency().is_ok());
        for (_, brick) in model.graph().bricks() {
            assert!(model.config().catalog.contains(brick.size()));
        }
    }

    #[test]
    fn test_can_merge_rules() {
        let mut model = BrickModel::solid_block(config(), 1, 3, 3).unwrap();
        let a = find(&model, 0, 0, 0);
        let b = find(&model, 0, 1, 0);
        let diagonal = find(&model, 0, 1, 1);
        assert!(model.can_merge(a, b, false));
        assert!(!model.can_merge(a, diagonal, false));
        assert!(!model.can_merge(a, a, false));

        // Visible colours never blend
        model.graph.set_color(b, 5);
        assert!(!model.can_merge(a, b, false));
        model.graph.set_color(b, model.config().default_color);

        // 1x3 is legal, 2x3 made of 1x3 + 1x2 is not a rectangle
        let ab = model.merge_bricks(a, b);
        let c = find(&model, 0, 2, 0);
        assert!(model.can_merge(ab, c, false));
        let abc = model.merge_bricks(ab, c);
        assert_eq!(model.graph().brick(abc).size(), BrickSize::new(1, 3));
        let d = find(&model, 0, 0, 1);
        assert!(!model.can_merge(abc, d, false));
    }

    #[test]
    fn test_can_merge_respects_catalog() {
        let config = AssemblyConfig {
            catalog: BrickCatalog::new([BrickSize::UNIT, BrickSize::new(1, 2)]),
            ..config()
        };
        let mut model = BrickModel::solid_block(config, 1, 3, 1).unwrap();
        let a = find(&model, 0, 0, 0);
        let b = find(&model, 0, 1, 0);
        let ab = model.merge_bricks(a, b);
        let c = find(&model, 0, 2, 0);
        assert!(!model.can_merge(ab, c, false));
    }

    #[test]
    fn test_quota_gates_merging() {
        let size = BrickSize::new(1, 2);
        let mut model = BrickModel::solid_block(config(), 1, 4, 1).unwrap();
        model.set_brick_limit(size, Some(1));
        let a = find(&model, 0, 0, 0);
        let b = find(&model, 0, 1, 0);
        assert!(model.can_merge(a, b, true));
        model.merge_bricks(a, b);

        let c = find(&model, 0, 2, 0);
        let d = find(&model, 0, 3, 0);
        assert!(!model.can_merge(c, d, true));
        assert!(model.can_merge(c, d, false));
    }

    #[test]
    fn test_merge_bricks_rewires_neighbours() {
        let mut model = BrickModel::solid_block(config(), 2, 2, 1).unwrap();
        let a = find(&model, 0, 0, 0);
        let b = find(&model, 0, 1, 0);
        let top_left = find(&model, 1, 0, 0);
        let top_right = find(&model, 1, 1, 0);

        let merged = model.merge_bricks(a, b);
        assert!(!model.graph().contains(a));
        assert!(!model.graph().contains(b));
        let brick = *model.graph().brick(merged);
        assert_eq!((brick.pos_x(), brick.pos_y(), brick.size_x(), brick.size_y()), (0, 0, 2, 1));
        assert!(brick.is_outer());
        assert!(model.graph().has_edge(merged, top_left));
        assert!(model.graph().has_edge(merged, top_right));
        assert!(model.graph().lateral_neighbours(merged).is_empty());
        assert!(model.graph().lateral_neighbours(top_left).contains(&top_right));
        assert!(model.graph().check_consistency().is_ok());
    }

    #[test]
    fn test_merge_bricks_releases_grid() {
        let mut model = BrickModel::solid_block(config(), 3, 3, 3).unwrap();
        assert!(model.has_voxel_grid());
        let a = find(&model, 0, 0, 0);
        let b = find(&model, 0, 1, 0);
        model.merge_bricks(a, b);

        // The grid would still hand out the ids of the merged units
        assert!(!model.has_voxel_grid());
        assert!(matches!(model.build_neighbourhood(), Err(Error::GridReleased)));
        assert!(matches!(model.pre_hollow(1), Err(Error::GridReleased)));
        assert!(matches!(model.add_voxel(2, 2, 2), Err(Error::GridReleased)));
        assert!(model.graph().check_consistency().is_ok());
    }

    #[test]
    #[should_panic]
    fn test_merge_bricks_rejects_gaps() {
        let mut model = BrickModel::solid_block(config(), 1, 3, 1).unwrap();
        let a = find(&model, 0, 0, 0);
        let c = find(&model, 0, 2, 0);
        model.merge_bricks(a, c);
    }

    #[test]
    fn test_max_connectivity_prefers_connected_candidate() {
        // Row of three on level 0, one voxel above the right cell
        let cells = [(0, 0, 0), (0, 1, 0), (0, 2, 0), (1, 2, 0)];
        let mut model = BrickModel::from_voxels(config(), (2, 3, 1), cells).unwrap();
        let left = find(&model, 0, 0, 0);
        let middle = find(&model, 0, 1, 0);
        let right = find(&model, 0, 2, 0);
        assert_eq!(MaxConnectivityStrategy::score(model.graph(), middle, right), 1);
        assert_eq!(MaxConnectivityStrategy::score(model.graph(), middle, left), 0);

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            let choice =
                MaxConnectivityStrategy.choose(model.graph(), middle, &[left, right], &mut rng);
            assert_eq!(choice, Some(right));
        }
        let best = model.find_best_neighbour(middle, &MaxConnectivityStrategy, false);
        assert_eq!(best, Some(right));
        assert!(RandomStrategy.choose(model.graph(), middle, &[], &mut rng).is_none());
    }

    #[test]
    fn test_merge_is_reproducible_with_seed() {
        let run = || {
            let mut model = BrickModel::solid_block(config(), 3, 5, 5).unwrap();
            let options = model.next_merge_options();
            model.merge(options);
            let mut bricks: Vec<Brick> = model.graph().bricks().map(|(_, b)| *b).collect();
            bricks.sort_by_key(|b| (b.level(), b.pos_x(), b.pos_y()));
            bricks
        };
        assert_eq!(run(), run());
    }
}
