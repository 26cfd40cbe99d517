//! Spatial decomposition of the target image
//!
//! This module contains:
//! - The region abstraction shared by matching and assembly
//! - Uniform and adaptive partitioning strategies

/// Uniform grid and adaptive merged partitioning
pub mod partition;
/// Regions and the partition container
pub mod region;

pub use partition::{AdaptiveConfig, MergeCriterion, crop_grid, partition_adaptive, partition_uniform};
pub use region::{Partition, Region};
