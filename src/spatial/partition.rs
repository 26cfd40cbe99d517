//! Target partitioning strategies
//!
//! The uniform strategy tiles the target exactly and drops the remainder strips
//! along the right and bottom edges. The adaptive strategy starts from a fine
//! grid of cells and greedily merges flat neighbourhoods into larger rectangles,
//! so detailed areas keep fine granularity.

use crate::color::{ExtractionConfig, Lab, SalientColor, ab_distance, dominant_color, lab_distance};
use crate::io::configuration::{DEFAULT_MAX_SPAN, DEFAULT_MERGE_THRESHOLD};
use crate::io::error::{Result, computation_error, invalid_parameter, invalid_source};
use crate::spatial::region::{Partition, Region};
use bitvec::vec::BitVec;
use image::{RgbImage, imageops};
use ndarray::Array2;

/// When two neighbouring cells may be merged into one region
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MergeCriterion {
    /// Rank-1 colors within `threshold` in the a*b* plane
    Chroma {
        /// Maximum chroma distance to the seed cell
        threshold: f64,
    },
    /// Both cells flat and their mean colors close
    ///
    /// A cell is flat when the RMS L*a*b* deviation of its pixels from its mean
    /// is at most `threshold`.
    Variation {
        /// Maximum internal deviation and mean-color distance
        threshold: f64,
    },
}

impl MergeCriterion {
    const fn threshold(self) -> f64 {
        match self {
            Self::Chroma { threshold } | Self::Variation { threshold } => threshold,
        }
    }
}

impl Default for MergeCriterion {
    fn default() -> Self {
        Self::Chroma {
            threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }
}

/// Parameters of the adaptive strategy
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveConfig {
    /// Width and height of the finest cell
    pub cell_size: (u32, u32),
    /// Merge rule for neighbouring cells
    pub criterion: MergeCriterion,
    /// Maximum number of cells a region may span along either axis
    pub max_span: usize,
    /// Color extraction used for cells and merged regions
    pub extraction: ExtractionConfig,
}

impl AdaptiveConfig {
    /// Defaults for the given cell size
    pub fn with_cell_size(cell_size: (u32, u32)) -> Self {
        Self {
            cell_size,
            criterion: MergeCriterion::default(),
            max_span: DEFAULT_MAX_SPAN,
            extraction: ExtractionConfig::for_regions(),
        }
    }

    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero cell size, zero span or a negative
    /// or non-finite threshold
    pub fn validate(&self) -> Result<()> {
        validate_tile_size("cell_size", self.cell_size)?;
        if self.max_span == 0 {
            return Err(invalid_parameter(
                "max_span",
                &self.max_span,
                &"must be at least one cell",
            ));
        }
        let threshold = self.criterion.threshold();
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid_parameter(
                "threshold",
                &threshold,
                &"must be a non-negative number",
            ));
        }
        self.extraction.validate()
    }
}

fn validate_tile_size(parameter: &'static str, size: (u32, u32)) -> Result<()> {
    if size.0 == 0 || size.1 == 0 {
        return Err(invalid_parameter(
            parameter,
            &format!("{}x{}", size.0, size.1),
            &"width and height must be positive",
        ));
    }
    Ok(())
}

/// Number of whole tiles along each axis as (rows, cols)
fn grid_shape(image: &RgbImage, tile_size: (u32, u32)) -> Result<(u32, u32)> {
    validate_tile_size("tile_size", tile_size)?;
    let cols = image.width() / tile_size.0;
    let rows = image.height() / tile_size.1;
    if rows == 0 || cols == 0 {
        return Err(invalid_source(&format!(
            "{}x{} target is smaller than one {}x{} tile",
            image.width(),
            image.height(),
            tile_size.0,
            tile_size.1
        )));
    }
    Ok((rows, cols))
}

/// Crop the target into whole tiles indexed by (row, col)
///
/// # Errors
///
/// Returns an error if the tile size is zero or larger than the image
pub fn crop_grid(image: &RgbImage, tile_size: (u32, u32)) -> Result<Array2<RgbImage>> {
    let (rows, cols) = grid_shape(image, tile_size)?;
    let (tile_width, tile_height) = tile_size;

    let mut tiles = Vec::with_capacity(rows as usize * cols as usize);
    for row in 0..rows {
        for col in 0..cols {
            tiles.push(
                imageops::crop_imm(
                    image,
                    col * tile_width,
                    row * tile_height,
                    tile_width,
                    tile_height,
                )
                .to_image(),
            );
        }
    }

    Array2::from_shape_vec((rows as usize, cols as usize), tiles)
        .map_err(|e| computation_error("crop grid", &e))
}

/// Divide the target into a uniform grid of regions
///
/// # Errors
///
/// Returns an error if:
/// - The tile size is zero or larger than the image
/// - The extraction configuration is invalid
pub fn partition_uniform(
    image: &RgbImage,
    tile_size: (u32, u32),
    extraction: &ExtractionConfig,
) -> Result<Partition> {
    extraction.validate()?;
    let tiles = crop_grid(image, tile_size)?;

    let mut regions = Vec::with_capacity(tiles.len());
    for ((row, col), tile) in tiles.indexed_iter() {
        regions.push(Region {
            x: col as u32 * tile_size.0,
            y: row as u32 * tile_size.1,
            width: tile_size.0,
            height: tile_size.1,
            color: dominant_color(tile, extraction)?,
        });
    }

    let regions = Array2::from_shape_vec(tiles.dim(), regions)
        .map_err(|e| computation_error("uniform partition", &e))?;
    tracing::debug!(regions = regions.len(), "partitioned target into uniform grid");

    Ok(Partition::Grid { tile_size, regions })
}

struct Cell {
    color: SalientColor,
    mean: Lab,
    variation: f64,
}

impl Cell {
    fn analyze(tile: &RgbImage, extraction: &ExtractionConfig) -> Result<Self> {
        let color = dominant_color(tile, extraction)?;
        let labs: Vec<Lab> = tile.pixels().map(|pixel| Lab::from_rgb(pixel.0)).collect();
        let count = labs.len().max(1) as f64;

        let mean = labs.iter().fold(Lab::default(), |acc, lab| {
            Lab::new(acc.l + lab.l, acc.a + lab.a, acc.b + lab.b)
        });
        let mean = Lab::new(mean.l / count, mean.a / count, mean.b / count);

        let variance = labs
            .iter()
            .map(|&lab| lab_distance(lab, mean).powi(2))
            .sum::<f64>()
            / count;

        Ok(Self {
            color,
            mean,
            variation: variance.sqrt(),
        })
    }

    fn compatible(&self, other: &Self, criterion: MergeCriterion) -> bool {
        match criterion {
            MergeCriterion::Chroma { threshold } => {
                ab_distance(self.color.lab, other.color.lab) <= threshold
            }
            MergeCriterion::Variation { threshold } => {
                self.variation <= threshold
                    && other.variation <= threshold
                    && lab_distance(self.mean, other.mean) <= threshold
            }
        }
    }
}

/// Divide the target into regions of heterogeneous size
///
/// Cells are visited in row-major order. Each unassigned cell seeds a region
/// that grows right while the next cell is compatible with the seed, then down
/// while the whole next row segment is, up to `max_span` cells per axis.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The cell size is larger than the image
pub fn partition_adaptive(image: &RgbImage, config: &AdaptiveConfig) -> Result<Partition> {
    config.validate()?;
    let crops = crop_grid(image, config.cell_size)?;
    let (rows, cols) = crops.dim();
    let (cell_width, cell_height) = config.cell_size;

    let cells = crops
        .iter()
        .map(|tile| Cell::analyze(tile, &config.extraction))
        .collect::<Result<Vec<_>>>()?;
    let cells = Array2::from_shape_vec((rows, cols), cells)
        .map_err(|e| computation_error("adaptive partition", &e))?;

    let mut assigned: BitVec = BitVec::repeat(false, rows * cols);
    let is_free = |assigned: &BitVec, row: usize, col: usize| {
        assigned.get(row * cols + col).as_deref() == Some(&false)
    };

    let mut regions = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if !is_free(&assigned, row, col) {
                continue;
            }
            let Some(seed) = cells.get((row, col)) else {
                continue;
            };
            let joins = |r: usize, c: usize| {
                cells
                    .get((r, c))
                    .is_some_and(|cell| seed.compatible(cell, config.criterion))
            };

            let mut span_cols = 1;
            while span_cols < config.max_span
                && col + span_cols < cols
                && is_free(&assigned, row, col + span_cols)
                && joins(row, col + span_cols)
            {
                span_cols += 1;
            }

            let mut span_rows = 1;
            while span_rows < config.max_span
                && row + span_rows < rows
                && (col..col + span_cols)
                    .all(|c| is_free(&assigned, row + span_rows, c) && joins(row + span_rows, c))
            {
                span_rows += 1;
            }

            for r in row..row + span_rows {
                for c in col..col + span_cols {
                    assigned.set(r * cols + c, true);
                }
            }

            let x = col as u32 * cell_width;
            let y = row as u32 * cell_height;
            let width = span_cols as u32 * cell_width;
            let height = span_rows as u32 * cell_height;
            let color = if span_rows == 1 && span_cols == 1 {
                seed.color
            } else {
                let merged = imageops::crop_imm(image, x, y, width, height).to_image();
                dominant_color(&merged, &config.extraction)?
            };

            regions.push(Region {
                x,
                y,
                width,
                height,
                color,
            });
        }
    }

    tracing::debug!(
        cells = rows * cols,
        regions = regions.len(),
        "merged cells into adaptive regions"
    );

    Ok(Partition::Adaptive {
        cell_size: config.cell_size,
        canvas: (cols as u32 * cell_width, rows as u32 * cell_height),
        regions,
    })
}
