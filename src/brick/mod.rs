//! Bricks, legal footprints and the voxel grid they are seeded from

pub mod brick;
pub mod handle;
pub mod catalog;
pub mod dimensions;
pub mod voxel_grid;

pub use brick::{Brick, BrickSize};
pub use handle::BrickId;
pub use catalog::{BrickCatalog, Palette, PaletteColor};
pub use voxel_grid::VoxelGrid;
