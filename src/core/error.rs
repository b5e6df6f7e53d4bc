//! Error types for the brick assembly engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Voxel grid has not been sized, call set_voxel_grid_dimensions first")]
    GridNotSized,

    #[error("Voxel grid {height}x{width}x{depth} is too large")]
    GridTooLarge { height: i32, width: i32, depth: i32 },

    #[error("Voxel grid was released, it is only available before the first merge")]
    GridReleased,

    #[error("Voxel ({level}, {x}, {y}) is outside the {height}x{width}x{depth} grid")]
    VoxelOutOfBounds {
        level: i32,
        x: i32,
        y: i32,
        height: i32,
        width: i32,
        depth: i32,
    },

    #[error("Voxel ({level}, {x}, {y}) is already occupied")]
    DuplicateVoxel { level: i32, x: i32, y: i32 },

    #[error("Shell thickness must be at least 1, got {0}")]
    InvalidShellThickness(i32),
}
