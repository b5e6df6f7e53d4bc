//! Brickify - assemble voxel models from interlocking bricks
//!
//! A voxel model is seeded as unit bricks, then greedily merged into larger
//! catalog bricks while keeping the stud-connection graph in one piece.

pub mod core;
pub mod brick;
pub mod graph;
pub mod assembly;
