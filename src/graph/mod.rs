//! Structural brick graph and connectivity analysis

pub mod brick_graph;
pub mod connectivity;
pub mod pool;
pub mod scratch;

pub use brick_graph::{BrickGraph, VertexAnnotation};
pub use connectivity::ConnectivityAnalysis;
pub use pool::CandidatePool;
pub use scratch::{LocalCounts, ScratchGraph, RING_DEPTH};
