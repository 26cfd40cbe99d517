//! Photomosaic engine: rebuilds a target image from a pool of candidate images
//!
//! Pool images are catalogued by their salient colors in a SQLite store. The
//! target is divided into regions, each region is matched to a pool image by
//! perceptual color with usage fairness, and the chosen images are composed
//! onto the output canvas.

#![forbid(unsafe_code)]

/// Region-to-image matching and candidate scoring
pub mod algorithm;
/// Perceptual color space and salient color extraction
pub mod color;
/// Input/output operations, assembly and error handling
pub mod io;
/// Probability utilities for the reuse draw
pub mod math;
/// Persistent image pool and its construction
pub mod pool;
/// Target regions and partitioning strategies
pub mod spatial;

pub use io::error::{MosaicError, Result};
