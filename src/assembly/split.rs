//! Split and repair - break bricks back into unit cells around weak spots

use std::collections::BTreeSet;

use crate::brick::{Brick, BrickId};

use super::model::BrickModel;

/// Lateral neighbour count of a unit brick with every side covered
const FULL_LATERAL: usize = 4;

impl BrickModel {
    /// Replace a brick by unit bricks covering its footprint.
    ///
    /// Adjacency of the new units is rebuilt from geometry against each
    /// other and the old brick's neighbours. A unit with fewer than four
    /// lateral or two vertical neighbours is flagged outer, which
    /// over-reports outer bricks inside hollow models.
    ///
    /// Releases the voxel grid. Returns false (and does nothing) for unit
    /// bricks.
    pub fn split_brick(&mut self, id: BrickId) -> bool {
        let old = *self.graph.brick(id);
        if old.is_unit() {
            return false;
        }
        self.release_grid();
        let old_lateral: Vec<BrickId> = self.graph.lateral_neighbours(id).iter().copied().collect();
        let old_vertical: Vec<BrickId> = self.graph.vertical_neighbours(id).iter().copied().collect();

        let units: Vec<BrickId> = old
            .cells()
            .map(|(x, y)| {
                let unit = Brick::unit(old.level(), x, y).with_color(old.color_id());
                self.graph.add_brick(unit)
            })
            .collect();
        let candidates: Vec<BrickId> = units.iter().chain(old_lateral.iter()).copied().collect();

        for &unit in &units {
            let brick = *self.graph.brick(unit);
            for &candidate in &candidates {
                if candidate != unit && brick.is_lateral_neighbour(self.graph.brick(candidate)) {
                    self.graph.add_lateral(unit, candidate);
                }
            }

            let mut stacked = 0;
            for &neighbour in &old_vertical {
                if brick.is_connected_to(self.graph.brick(neighbour)) {
                    self.graph.add_edge(unit, neighbour);
                    stacked += 1;
                }
            }
            debug_assert!(stacked <= 2, "unit brick with {} vertical edges", stacked);

            let is_outer = self.graph.lateral_neighbours(unit).len() < FULL_LATERAL || stacked < 2;
            self.graph.set_outer(unit, is_outer);
        }

        self.graph.remove_brick(id);
        true
    }

    fn split_all(&mut self, bricks: BTreeSet<BrickId>) -> usize {
        bricks
            .into_iter()
            .filter(|&id| self.graph.contains(id) && self.split_brick(id))
            .count()
    }

    /// Split every brick that neighbours a brick of another component.
    /// Returns the number of bricks split.
    pub fn split_con_comp(&mut self) -> usize {
        self.ensure_connectivity();
        let mut rifts = BTreeSet::new();
        for id in self.graph.ids() {
            let Some(own) = self.graph.annotation(id) else {
                continue;
            };
            for &n in self.graph.lateral_neighbours(id) {
                if self.graph.annotation(n).is_some_and(|a| a.component != own.component) {
                    rifts.insert(id);
                    rifts.insert(n);
                }
            }
        }

        let split = self.split_all(rifts);
        self.graph.refresh_connectivity();
        split
    }

    /// Split every bad articulation point together with its lateral and
    /// vertical neighbours. Returns the number of bricks split.
    pub fn split_bicon_comp(&mut self) -> usize {
        self.ensure_connectivity();
        let mut weak = BTreeSet::new();
        for id in self.graph.ids() {
            if !self.graph.annotation(id).is_some_and(|a| a.is_bad_articulation) {
                continue;
            }
            weak.insert(id);
            weak.extend(self.graph.lateral_neighbours(id).iter().copied());
            weak.extend(self.graph.vertical_neighbours(id).iter().copied());
        }

        let split = self.split_all(weak);
        self.graph.refresh_connectivity();
        split
    }

    /// Split-then-merge component repair for the configured number of rounds
    pub fn loop_con_comp(&mut self) -> usize {
        let rounds = self.config.shake_rounds;
        for _ in 0..rounds {
            self.split_con_comp();
            let options = self.next_merge_options();
            self.merge(options);
        }
        rounds
    }

    /// Split-then-merge articulation repair for the configured number of rounds
    pub fn loop_bicon_comp(&mut self) -> usize {
        let rounds = self.config.shake_rounds;
        for _ in 0..rounds {
            self.split_bicon_comp();
            let options = self.next_merge_options();
            self.merge(options);
        }
        rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::config::AssemblyConfig;
    use crate::assembly::merge::MergeOptions;
    use crate::assembly::shapes::VoxelShape;
    use crate::brick::BrickSize;

    fn config() -> AssemblyConfig {
        AssemblyConfig::with_seed(11)
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
    fn test_split_unit_is_noop() {
        let mut model = BrickModel::solid_block(config(), 1, 2, 1).unwrap();
        let a = find(&model, 0, 0, 0);
        assert!(!model.split_brick(a));
        assert!(model.graph().contains(a));
        assert!(model.has_voxel_grid());
    }

    #[test]
    fn test_merge_then_split_restores_footprints() {
        let mut model = BrickModel::solid_block(config(), 2, 2, 1).unwrap();
        let a = find(&model, 0, 0, 0);
        let b = find(&model, 0, 1, 0);
        let before: BTreeSet<(i32, i32)> = [a, b]
            .iter()
            .map(|&id| (model.graph().brick(id).pos_x(), model.graph().brick(id).pos_y()))
            .collect();

        let merged = model.merge_bricks(a, b);
        assert!(model.split_brick(merged));
        assert!(!model.graph().contains(merged));

        let after: BTreeSet<(i32, i32)> = model
            .graph()
            .bricks_on_level(0)
            .map(|(_, b)| {
                assert!(b.is_unit());
                (b.pos_x(), b.pos_y())
            })
            .collect();
        assert_eq!(after, before);
        assert_eq!(model.brick_counts().get(&BrickSize::UNIT), Some(&4));
        assert!(model.graph().check_consistency().is_ok());

        let left = find(&model, 0, 0, 0);
        let right = find(&model, 0, 1, 0);
        assert!(model.graph().lateral_neighbours(left).contains(&right));
        assert!(model.graph().has_edge(left, find(&model, 1, 0, 0)));
        assert!(model.graph().has_edge(right, find(&model, 1, 1, 0)));
    }

    #[test]
    fn test_split_keeps_color_and_links_old_neighbours() {
        let mut model = BrickModel::solid_block(config(), 1, 3, 1).unwrap();
        let a = find(&model, 0, 0, 0);
        let b = find(&model, 0, 1, 0);
        let c = find(&model, 0, 2, 0);
        model.graph.set_color(a, 4);
        model.graph.set_color(b, 4);
        let ab = model.merge_bricks(a, b);
        assert!(model.graph().lateral_neighbours(ab).contains(&c));

        model.split_brick(ab);
        let middle = find(&model, 0, 1, 0);
        assert_eq!(model.graph().brick(middle).color_id(), 4);
        assert!(model.graph().lateral_neighbours(c).contains(&middle));
        assert!(model.graph().lateral_neighbours(middle).contains(&c));
    }

    #[test]
    fn test_split_reflags_units_next_to_cavity() {
        // Pre-hollowing leaves the flags of the bricks around the cavity
        // alone. A merge and split recomputes them and the unit below the
        // cavity comes back outer although it was built inner.
        let mut model = BrickModel::solid_block(config(), 7, 7, 7).unwrap();
        model.pre_hollow(2).unwrap();
        let a = find(&model, 1, 3, 3);
        let b = find(&model, 1, 3, 4);
        assert!(!model.graph().brick(a).is_outer());

        let merged = model.merge_bricks(a, b);
        assert!(!model.graph().brick(merged).is_outer());
        assert!(model.split_brick(merged));

        let a = find(&model, 1, 3, 3);
        assert_eq!(model.graph().lateral_neighbours(a).len(), 4);
        assert_eq!(model.graph().degree(a), 1);
        assert!(model.graph().brick(a).is_outer());
    }

    #[test]
    fn test_split_con_comp_splits_bricks_across_rift() {
        // Column at x = 0, two loose voxels on the ground next to it
        let cells = [(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 2, 0)];
        let mut model = BrickModel::from_voxels(config(), (2, 3, 1), cells).unwrap();
        assert_eq!(model.component_count(), 3);
        assert_eq!(model.split_con_comp(), 0);

        let loose = model.merge_bricks(find(&model, 0, 1, 0), find(&model, 0, 2, 0));
        assert_eq!(model.component_count(), 2);

        // The merged brick sits next to the column but shares no edge with it
        assert_eq!(model.split_con_comp(), 1);
        assert!(!model.graph().contains(loose));
        assert_eq!(model.brick_count(), 4);
        assert_eq!(model.component_count(), 3);
        assert!(model.graph().check_consistency().is_ok());
    }

    #[test]
    fn test_split_bicon_comp_breaks_weak_point() {
        // 5-tall tower, a 1x2 brick in the middle joined with a side voxel
        let cells = [(0, 0, 0), (1, 0, 0), (2, 0, 0), (2, 1, 0), (3, 0, 0), (4, 0, 0)];
        let mut model = BrickModel::from_voxels(config(), (5, 2, 1), cells).unwrap();
        let middle = model.merge_bricks(find(&model, 2, 0, 0), find(&model, 2, 1, 0));
        assert!(model.annotation(middle).unwrap().is_bad_articulation);

        let split = model.split_bicon_comp();
        assert_eq!(split, 1);
        assert!(!model.graph().contains(middle));
        assert_eq!(model.brick_count(), 6);
        assert!(model.graph().check_consistency().is_ok());
    }

    #[test]
    fn test_shake_loops_keep_invariants() {
        let shape = VoxelShape::sphere(7);
        let mut model = BrickModel::from_shape(config(), &shape).unwrap();
        model.merge(MergeOptions::initial());
        assert_eq!(model.loop_con_comp(), model.config().shake_rounds);
        assert_eq!(model.loop_bicon_comp(), model.config().shake_rounds);

        let cells: usize = model.graph().bricks().map(|(_, b)| b.stud_count() as usize).sum();
        assert_eq!(cells, shape.len());
        assert!(model.graph().check_consistency().is_ok());
    }
}
