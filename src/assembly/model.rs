//! Brick model - the assembly engine facade
//!
//! Owns the brick graph, the seeding voxel grid, the random generator and
//! the quota table. The engine operations live in sibling modules as
//! further `impl BrickModel` blocks.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::brick::{Brick, BrickId, BrickSize, VoxelGrid};
use crate::core::{Error, Result};
use crate::graph::{BrickGraph, VertexAnnotation};

use super::config::AssemblyConfig;
use super::shapes::VoxelShape;

/// Lifecycle of the seeding voxel grid
#[derive(Clone, Debug)]
pub(crate) enum GridState {
    /// `set_voxel_grid_dimensions` has not been called
    Unsized,
    Ready(VoxelGrid),
    /// Dropped after pre-hollowing or the first merge
    Released,
}

/// Lateral and vertical probe offsets as `(level, x, y)`
const LATERAL_PROBES: [(i32, i32, i32); 4] = [(0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)];
const FULL_NEIGHBOURHOOD: usize = 6;

/// Outcome of graph construction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Bricks kept
    pub bricks: usize,
    /// Unit bricks dropped because no voxel touched them
    pub floating_removed: usize,
}

/// A voxel model being assembled from bricks
#[derive(Clone, Debug)]
pub struct BrickModel {
    pub(crate) graph: BrickGraph,
    pub(crate) grid: GridState,
    pub(crate) config: AssemblyConfig,
    pub(crate) limits: BTreeMap<BrickSize, usize>,
    pub(crate) rng: StdRng,
    /// Completed merge calls
    pub(crate) merge_count: usize,
    /// Quotas gate merging once the limiter has run
    pub(crate) quota_enforced: bool,
}

fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

impl BrickModel {
    /// Create an empty model. Fails if the configuration is invalid.
    pub fn new(config: AssemblyConfig) -> Result<Self> {
        config.validate()?;
        let seed = resolve_seed(config.seed);
        log::debug!("Brick model seeded with {}", seed);
        let limits = config.brick_limits.iter().map(|l| (l.size, l.max)).collect();
        Ok(Self {
            graph: BrickGraph::new(),
            grid: GridState::Unsized,
            config,
            limits,
            rng: StdRng::seed_from_u64(seed),
            merge_count: 0,
            quota_enforced: false,
        })
    }

    /// Build a model from a list of occupied `(level, x, y)` cells
    pub fn from_voxels(
        config: AssemblyConfig,
        (height, width, depth): (i32, i32, i32),
        cells: impl IntoIterator<Item = (i32, i32, i32)>,
    ) -> Result<Self> {
        let mut model = Self::new(config)?;
        model.set_voxel_grid_dimensions(height, width, depth)?;
        for (level, x, y) in cells {
            model.add_voxel(level, x, y)?;
        }
        model.build_neighbourhood()?;
        Ok(model)
    }

    /// Build a model from a voxel shape
    pub fn from_shape(config: AssemblyConfig, shape: &VoxelShape) -> Result<Self> {
        Self::from_voxels(
            config,
            (shape.height, shape.width, shape.depth),
            shape.cells.iter().copied(),
        )
    }

    /// Completely filled `height x width x depth` block
    pub fn solid_block(config: AssemblyConfig, height: i32, width: i32, depth: i32) -> Result<Self> {
        Self::from_shape(config, &VoxelShape::block(height, width, depth))
    }

    /// Allocate an empty voxel grid of the given size, replacing any previous one
    pub fn set_voxel_grid_dimensions(&mut self, height: i32, width: i32, depth: i32) -> Result<()> {
        self.grid = GridState::Ready(VoxelGrid::new(height, width, depth)?);
        Ok(())
    }

    pub(crate) fn grid(&self) -> Result<&VoxelGrid> {
        match &self.grid {
            GridState::Ready(grid) => Ok(grid),
            GridState::Unsized => Err(Error::GridNotSized),
            GridState::Released => Err(Error::GridReleased),
        }
    }

    fn grid_mut(&mut self) -> Result<&mut VoxelGrid> {
        match &mut self.grid {
            GridState::Ready(grid) => Ok(grid),
            GridState::Unsized => Err(Error::GridNotSized),
            GridState::Released => Err(Error::GridReleased),
        }
    }

    /// Drop the voxel grid; its brick ids go stale once bricks change shape
    pub(crate) fn release_grid(&mut self) {
        if matches!(self.grid, GridState::Ready(_)) {
            log::debug!("Releasing voxel grid");
            self.grid = GridState::Released;
        }
    }

    /// True while the seeding voxel grid is still available
    pub fn has_voxel_grid(&self) -> bool {
        matches!(self.grid, GridState::Ready(_))
    }

    /// Create the unit brick for an occupied voxel
    pub fn add_voxel(&mut self, level: i32, x: i32, y: i32) -> Result<BrickId> {
        let default_color = self.config.default_color;
        let grid = self.grid_mut()?;
        if !grid.in_bounds(level, x, y) {
            return Err(Error::VoxelOutOfBounds {
                level,
                x,
                y,
                height: grid.height(),
                width: grid.width(),
                depth: grid.depth(),
            });
        }
        if grid.is_occupied(level, x, y) {
            return Err(Error::DuplicateVoxel { level, x, y });
        }

        let id = self
            .graph
            .add_brick(Brick::unit(level, x, y).with_color(default_color));
        if let GridState::Ready(grid) = &mut self.grid {
            grid.set(level, x, y, Some(id));
        }
        Ok(id)
    }

    /// Link every unit brick to its grid neighbours.
    ///
    /// Lateral hits become lateral neighbours, the hit above becomes a
    /// vertical edge. Bricks touching fewer than six voxels are outer,
    /// bricks touching none are dropped.
    pub fn build_neighbourhood(&mut self) -> Result<BuildReport> {
        let default_color = self.config.default_color;
        log::debug!("Building neighbourhood of {} voxels", self.grid()?.occupied_count());
        let ids: Vec<BrickId> = self.graph.ids().collect();
        let mut floating = Vec::new();

        for id in ids {
            let brick = *self.graph.brick(id);
            debug_assert!(brick.is_unit(), "neighbourhood is built from unit bricks only");
            let (level, x, y) = (brick.level(), brick.pos_x(), brick.pos_y());

            let grid = self.grid()?;
            let lateral: Vec<BrickId> = LATERAL_PROBES
                .iter()
                .filter_map(|(dl, dx, dy)| grid.get(level + dl, x + dx, y + dy))
                .collect();
            let above = grid.get(level + 1, x, y);
            let below = grid.get(level - 1, x, y);
            let hits = lateral.len() + above.is_some() as usize + below.is_some() as usize;

            for n in lateral {
                self.graph.add_lateral(id, n);
            }
            if let Some(up) = above {
                self.graph.add_edge(id, up);
            }
            self.graph.set_outer(id, hits < FULL_NEIGHBOURHOOD);
            self.graph.set_color(id, default_color);

            if hits == 0 {
                floating.push(id);
            }
        }

        for id in &floating {
            if let Some(brick) = self.graph.remove_brick(*id) {
                log::warn!(
                    "Dropping floating voxel at level {}, ({}, {})",
                    brick.level(),
                    brick.pos_x(),
                    brick.pos_y()
                );
                if let GridState::Ready(grid) = &mut self.grid {
                    grid.set(brick.level(), brick.pos_x(), brick.pos_y(), None);
                }
            }
        }

        self.graph.refresh_connectivity();
        log::info!(
            "Built neighbourhood: {} bricks, {} components",
            self.graph.len(),
            self.graph.component_count()
        );
        Ok(BuildReport {
            bricks: self.graph.len(),
            floating_removed: floating.len(),
        })
    }

    /// Recompute connectivity if the topology changed since the last analysis
    pub(crate) fn ensure_connectivity(&mut self) {
        if self.graph.is_dirty() {
            self.graph.refresh_connectivity();
        }
    }

    /// Set or clear the quota of one footprint
    pub fn set_brick_limit(&mut self, size: BrickSize, max: Option<usize>) {
        match max {
            Some(max) => {
                self.limits.insert(size, max);
            }
            None => {
                self.limits.remove(&size);
            }
        }
    }

    /// Quota of one footprint, `None` if unlimited
    pub fn brick_limit(&self, size: BrickSize) -> Option<usize> {
        self.limits.get(&size).copied()
    }

    /// True once merges check quotas by default
    pub fn is_quota_enforced(&self) -> bool {
        self.quota_enforced
    }

    pub fn graph(&self) -> &BrickGraph {
        &self.graph
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn brick_count(&self) -> usize {
        self.graph.len()
    }

    pub fn level_count(&self) -> i32 {
        self.graph.level_count()
    }

    /// Live bricks on one level, for rendering and export
    pub fn bricks_on_level(&self, level: i32) -> impl Iterator<Item = &Brick> + '_ {
        self.graph.bricks_on_level(level).map(|(_, brick)| brick)
    }

    /// Live brick count per footprint
    pub fn brick_counts(&self) -> &BTreeMap<BrickSize, usize> {
        self.graph.type_counts()
    }

    pub fn component_count(&mut self) -> usize {
        self.ensure_connectivity();
        self.graph.component_count()
    }

    pub fn bad_articulation_count(&mut self) -> usize {
        self.ensure_connectivity();
        self.graph.bad_articulation_count()
    }

    /// Connectivity annotation of a live brick
    pub fn annotation(&mut self, id: BrickId) -> Option<VertexAnnotation> {
        self.ensure_connectivity();
        self.graph.annotation(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AssemblyConfig {
        AssemblyConfig::with_seed(42)
    }

    #[test]
    fn test_small_block() {
        let mut model = BrickModel::solid_block(config(), 2, 1, 2).unwrap();
        assert_eq!(model.brick_count(), 4);
        // Only vertical edges connect, so the two columns stand apart until merged
        assert_eq!(model.component_count(), 2);
        assert_eq!(model.bad_articulation_count(), 0);
        assert_eq!(model.level_count(), 2);
        assert!(model.graph().bricks().all(|(_, b)| b.is_outer()));
        assert!(model.graph().bricks().all(|(_, b)| b.color_id() == 2));
        assert_eq!(model.graph().outer_pool().len(), 4);
        assert!(model.graph().check_consistency().is_ok());
    }

    #[test]
    fn test_inner_voxel() {
        let model = BrickModel::solid_block(config(), 3, 3, 3).unwrap();
        assert_eq!(model.graph().inner_pool().len(), 1);
        let (id, _) = model
            .graph()
            .bricks_on_level(1)
            .find(|(_, b)| b.pos_x() == 1 && b.pos_y() == 1)
            .unwrap();
        assert!(!model.graph().brick(id).is_outer());
        assert_eq!(model.graph().lateral_neighbours(id).len(), 4);
        assert_eq!(model.graph().degree(id), 2);
    }

    #[test]
    fn test_isolated_voxel_is_dropped() {
        let mut model = BrickModel::new(config()).unwrap();
        model.set_voxel_grid_dimensions(3, 3, 3).unwrap();
        model.add_voxel(0, 0, 0).unwrap();
        model.add_voxel(0, 1, 0).unwrap();
        model.add_voxel(2, 2, 2).unwrap();
        let report = model.build_neighbourhood().unwrap();
        assert_eq!(report, BuildReport { bricks: 2, floating_removed: 1 });
        assert_eq!(model.bricks_on_level(2).count(), 0);
        assert_eq!(model.component_count(), 2);
        assert!(model.graph().check_consistency().is_ok());
    }

    #[test]
    fn test_tower_articulation() {
        let mut model = BrickModel::from_shape(config(), &VoxelShape::tower(5)).unwrap();
        assert_eq!(model.component_count(), 1);

        let ids: Vec<_> = (0..5)
            .map(|l| model.graph().bricks_on_level(l).next().unwrap().0)
            .collect();
        let middle = model.annotation(ids[2]).unwrap();
        assert!(middle.is_articulation);
        // Both sides of the middle are chains longer than one brick
        assert!(middle.is_bad_articulation);
        for &l in &[1, 3] {
            let a = model.annotation(ids[l]).unwrap();
            assert!(a.is_articulation);
            assert!(!a.is_bad_articulation);
        }
        assert!(!model.annotation(ids[0]).unwrap().is_articulation);
        assert_eq!(model.bad_articulation_count(), 1);
    }

    #[test]
    fn test_voxel_errors() {
        let mut model = BrickModel::new(config()).unwrap();
        assert!(matches!(model.add_voxel(0, 0, 0), Err(Error::GridNotSized)));

        model.set_voxel_grid_dimensions(2, 2, 2).unwrap();
        assert!(matches!(model.add_voxel(2, 0, 0), Err(Error::VoxelOutOfBounds { .. })));
        assert!(matches!(model.add_voxel(0, -1, 0), Err(Error::VoxelOutOfBounds { .. })));
        model.add_voxel(0, 0, 0).unwrap();
        assert!(matches!(model.add_voxel(0, 0, 0), Err(Error::DuplicateVoxel { .. })));
    }

    #[test]
    fn test_oversized_grid_dimensions() {
        let mut model = BrickModel::new(config()).unwrap();
        let result = model.set_voxel_grid_dimensions(i32::MAX, i32::MAX, i32::MAX);
        assert!(matches!(result, Err(Error::GridTooLarge { .. })));
        assert!(!model.has_voxel_grid());
        assert!(matches!(model.add_voxel(0, 0, 0), Err(Error::GridNotSized)));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = config();
        config.default_color = 100;
        assert!(matches!(BrickModel::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_limits_from_config() {
        let size = BrickSize::new(2, 4);
        let mut model = BrickModel::new(config().with_limit(size, 7)).unwrap();
        assert_eq!(model.brick_limit(size), Some(7));
        model.set_brick_limit(size, None);
        assert_eq!(model.brick_limit(size), None);
        model.set_brick_limit(BrickSize::new(1, 2), Some(3));
        assert_eq!(model.brick_limit(BrickSize::new(2, 1)), Some(3));
    }

    #[test]
    fn test_grid_tiling_after_build() {
        let shape = VoxelShape::sphere(6);
        let model = BrickModel::from_shape(config(), &shape).unwrap();
        let cells: usize = model.graph().bricks().map(|(_, b)| b.stud_count() as usize).sum();
        assert_eq!(cells, shape.len());
    }
}
