//! Simple voxel shapes for demos, benches and tests

use glam::Vec3;

/// Occupied cells of a `height x width x depth` box, as `(level, x, y)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelShape {
    pub height: i32,
    pub width: i32,
    pub depth: i32,
    pub cells: Vec<(i32, i32, i32)>,
}

impl VoxelShape {
    /// Completely filled box
    pub fn block(height: i32, width: i32, depth: i32) -> Self {
        let mut cells = Vec::with_capacity((height.max(0) * width.max(0) * depth.max(0)) as usize);
        for level in 0..height {
            for x in 0..width {
                for y in 0..depth {
                    cells.push((level, x, y));
                }
            }
        }
        Self { height, width, depth, cells }
    }

    /// Solid ball filling a cube of side `diameter`
    pub fn sphere(diameter: i32) -> Self {
        let diameter = diameter.max(0);
        let radius = diameter as f32 / 2.0;
        let center = Vec3::splat(radius);
        let mut cells = Vec::new();

        for level in 0..diameter {
            for x in 0..diameter {
                for y in 0..diameter {
                    let cell = Vec3::new(x as f32 + 0.5, level as f32 + 0.5, y as f32 + 0.5);
                    if cell.distance(center) <= radius {
                        cells.push((level, x, y));
                    }
                }
            }
        }

        Self {
            height: diameter,
            width: diameter,
            depth: diameter,
            cells,
        }
    }

    /// Vertical column of `height` voxels
    pub fn tower(height: i32) -> Self {
        Self::block(height, 1, 1)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
