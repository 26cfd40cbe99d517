//! Regions of the target image and the partition that holds them
//!
//! A partition is either a dense grid (uniform strategy) or a flat list of
//! heterogeneous rectangles (adaptive strategy). Matching and assembly only use
//! the shared interface: iteration in placement order and the canvas size.

use crate::color::{Lab, SalientColor};
use ndarray::Array2;

/// A rectangular area of the target image with its representative color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    /// Left edge in target pixels
    pub x: u32,
    /// Top edge in target pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Rank-1 salient color of the area
    pub color: SalientColor,
}

impl Region {
    /// Perceptual color of the region
    pub const fn lab(&self) -> Lab {
        self.color.lab
    }

    /// Width and height
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Area in pixels
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether two regions share any pixel
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// The regions a target image was divided into
#[derive(Clone, Debug)]
pub enum Partition {
    /// Uniform tiling; every region has `tile_size`
    Grid {
        /// Width and height of every tile
        tile_size: (u32, u32),
        /// Regions indexed by (row, col)
        regions: Array2<Region>,
    },
    /// Merged cells of varying size
    Adaptive {
        /// Width and height of the finest cell
        cell_size: (u32, u32),
        /// Width and height covered by the cell grid
        canvas: (u32, u32),
        /// Regions in row-major order of their top-left cell
        regions: Vec<Region>,
    },
}

impl Partition {
    /// Regions in placement order
    pub fn regions(&self) -> Box<dyn Iterator<Item = &Region> + '_> {
        match self {
            Self::Grid { regions, .. } => Box::new(regions.iter()),
            Self::Adaptive { regions, .. } => Box::new(regions.iter()),
        }
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        match self {
            Self::Grid { regions, .. } => regions.len(),
            Self::Adaptive { regions, .. } => regions.len(),
        }
    }

    /// Whether the partition has no regions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Output canvas size covering every region
    pub fn canvas_size(&self) -> (u32, u32) {
        match self {
            Self::Grid { tile_size, regions } => {
                let (rows, cols) = regions.dim();
                (cols as u32 * tile_size.0, rows as u32 * tile_size.1)
            }
            Self::Adaptive { canvas, .. } => *canvas,
        }
    }

    /// Grid shape as (rows, cols), for uniform partitions only
    pub fn grid_shape(&self) -> Option<(usize, usize)> {
        match self {
            Self::Grid { regions, .. } => Some(regions.dim()),
            Self::Adaptive { .. } => None,
        }
    }
}
