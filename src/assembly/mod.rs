//! Brick assembly engine
//!
//! [`BrickModel`] turns a voxel model into a brick layout:
//! - graph construction from the voxel grid
//! - merging lateral neighbours into catalog bricks
//! - splitting weak spots and re-merging (auto-optimize)
//! - hollowing and per-footprint quotas

pub mod config;
pub mod hollow;
pub mod limit;
pub mod merge;
pub mod model;
pub mod optimize;
pub mod shapes;
pub mod split;
pub mod stats;

pub use config::{AssemblyConfig, BrickLimit, DEFAULT_COLOR_ID};
pub use hollow::HollowReport;
pub use limit::{Cut, LimitReport, QuotaShortfall};
pub use merge::{MaxConnectivityStrategy, MergeOptions, MergeStrategy, RandomStrategy, StrategyKind};
pub use model::{BrickModel, BuildReport};
pub use optimize::OptimizeReport;
pub use shapes::VoxelShape;
pub use stats::{ColorStats, ModelStats};
