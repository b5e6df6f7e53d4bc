//! Dense voxel presence grid used to seed the brick graph
//!
//! Indexed as `[level][x][y]`. Each occupied cell stores the id of the unit
//! brick created for it. The grid is only meaningful until bricks start
//! merging; after that the ids go stale and the grid is released.

use crate::core::{Error, Result};

use super::handle::BrickId;

/// Dense `height x width x depth` grid of optional unit-brick owners
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    height: i32,
    width: i32,
    depth: i32,
    cells: Vec<Option<BrickId>>,
}

impl VoxelGrid {
    /// Allocate an empty grid. Negative dimensions are clamped to zero.
    ///
    /// Fails with [`Error::GridTooLarge`] if the cell count does not fit in
    /// the address space.
    pub fn new(height: i32, width: i32, depth: i32) -> Result<Self> {
        let (height, width, depth) = (height.max(0), width.max(0), depth.max(0));
        let cell_count = (height as usize)
            .checked_mul(width as usize)
            .and_then(|n| n.checked_mul(depth as usize))
            .filter(|&n| n <= isize::MAX as usize / std::mem::size_of::<Option<BrickId>>())
            .ok_or(Error::GridTooLarge { height, width, depth })?;
        Ok(Self {
            height,
            width,
            depth,
            cells: vec![None; cell_count],
        })
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn in_bounds(&self, level: i32, x: i32, y: i32) -> bool {
        level >= 0 && level < self.height && x >= 0 && x < self.width && y >= 0 && y < self.depth
    }

    fn index(&self, level: i32, x: i32, y: i32) -> usize {
        debug_assert!(self.in_bounds(level, x, y));
        (level as usize * self.width as usize + x as usize) * self.depth as usize + y as usize
    }

    /// Owner of the cell, `None` if empty or out of bounds
    pub fn get(&self, level: i32, x: i32, y: i32) -> Option<BrickId> {
        if !self.in_bounds(level, x, y) {
            return None;
        }
        self.cells[self.index(level, x, y)]
    }

    pub fn is_occupied(&self, level: i32, x: i32, y: i32) -> bool {
        self.get(level, x, y).is_some()
    }

    /// Set the owner of an in-bounds cell
    pub fn set(&mut self, level: i32, x: i32, y: i32, brick: Option<BrickId>) {
        let index = self.index(level, x, y);
        self.cells[index] = brick;
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// True if every cell of the cube of half-side `radius` centred on the
    /// given cell is inside the grid and occupied.
    pub fn is_cube_filled(&self, level: i32, x: i32, y: i32, radius: i32) -> bool {
        for l in level - radius..=level + radius {
            for cx in x - radius..=x + radius {
                for cy in y - radius..=y + radius {
                    if !self.is_occupied(l, cx, cy) {
                        return false;
                    }
                }
            }
        }
        true
    }
}
