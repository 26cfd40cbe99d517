//! The durable image pool and its construction from a directory tree

/// Parallel pool construction from a directory tree
pub mod builder;
/// SQLite-backed catalogue with nearest-color queries and usage counters
pub mod index;

pub use builder::{BuildReport, PoolBuildConfig};
pub use index::{Candidate, ColorSample, DistanceMetric, PoolImage, PoolIndex, Registration};
